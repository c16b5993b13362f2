use std::io::{Cursor, Read};

use anyhow::Result;
use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::spawn_blocking;
use tokio_tar::Archive;
use zip::ZipArchive;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// 归档中的一个文件
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveEntry {
    /// 不含目录的文件名
    pub name: String,
    pub data: Vec<u8>,
}

/// 返回路径中最后一个 `/` 之后的部分
pub fn base_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(start) => &path[start + 1..],
        None => path,
    }
}

/// 按文件头判断格式，ZIP 以外的数据一律按 tar 读取
pub async fn read_archive(data: Vec<u8>) -> Result<Vec<ArchiveEntry>> {
    if is_zip(&data) {
        spawn_blocking(move || read_zip(&data)).await?
    } else {
        read_tar(&data[..]).await
    }
}

pub fn is_zip(data: &[u8]) -> bool {
    data.starts_with(ZIP_MAGIC)
}

/// 读取 ZIP 归档中的所有普通文件，规则与 [`read_tar`] 相同
pub fn read_zip(data: &[u8]) -> Result<Vec<ArchiveEntry>> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let mut files = vec![];
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if !file.is_file() {
            continue;
        }
        let name = base_name(file.name());
        if name.is_empty() {
            continue;
        }
        let name = name.to_owned();

        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;

        files.push(ArchiveEntry { name, data });
    }
    Ok(files)
}

/// 读取 tar 归档中的所有普通文件，按归档顺序返回
pub async fn read_tar<R: AsyncRead + Unpin + Send>(reader: R) -> Result<Vec<ArchiveEntry>> {
    let mut archive = Archive::new(reader);
    let mut entries = archive.entries()?;
    let mut files = vec![];

    // NOTE: tar 的 entries 必须按顺序读取，不能乱序并发
    while let Some(entry) = entries.next().await {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry.path()?.to_string_lossy().to_string();
        let name = base_name(&path);
        if name.is_empty() {
            continue;
        }
        let name = name.to_owned();

        let mut data = Vec::with_capacity(entry.header().size()? as usize);
        entry.read_to_end(&mut data).await?;

        files.push(ArchiveEntry { name, data });
    }
    Ok(files)
}
