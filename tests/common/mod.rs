#![allow(dead_code)]

use std::io::{Cursor, Write};

use anyhow::Result;
use facesearch::FaceDescriptor;
use facesearch::encoding::DESCRIPTOR_DIM;
use facesearch::extractor::{FaceExtractor, parse_descriptors};
use tokio_tar::{Builder, EntryType, Header};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// 把“图片”内容直接当作特征向量 JSON 解析的提取器
pub struct JsonExtractor;

impl FaceExtractor for JsonExtractor {
    fn extract(&self, image: &[u8]) -> Result<Vec<FaceDescriptor>> {
        parse_descriptors(image)
    }
}

pub fn descriptor(f: impl FnMut(usize) -> f64) -> FaceDescriptor {
    FaceDescriptor::try_from((0..DESCRIPTOR_DIM).map(f).collect::<Vec<_>>()).unwrap()
}

/// 生成一张包含给定人脸的“图片”
pub fn image_of(faces: &[&FaceDescriptor]) -> Vec<u8> {
    serde_json::to_vec(faces).unwrap()
}

/// 构建 tar 归档，`None` 表示目录
pub async fn build_tar(files: &[(&str, Option<&[u8]>)]) -> Vec<u8> {
    let mut builder = Builder::new(Vec::new());
    for (path, data) in files {
        let mut header = Header::new_gnu();
        header.set_mode(0o644);
        match data {
            Some(data) => {
                header.set_entry_type(EntryType::Regular);
                header.set_size(data.len() as u64);
                builder.append_data(&mut header, path, *data).await.unwrap();
            }
            None => {
                header.set_entry_type(EntryType::Directory);
                header.set_size(0);
                builder.append_data(&mut header, path, tokio::io::empty()).await.unwrap();
            }
        }
    }
    builder.into_inner().await.unwrap()
}

/// 构建 ZIP 归档，`None` 表示目录
pub fn build_zip(files: &[(&str, Option<&[u8]>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (path, data) in files {
        match data {
            Some(data) => {
                writer.start_file(*path, SimpleFileOptions::default()).unwrap();
                writer.write_all(data).unwrap();
            }
            None => writer.add_directory(*path, SimpleFileOptions::default()).unwrap(),
        }
    }
    writer.finish().unwrap().into_inner()
}
