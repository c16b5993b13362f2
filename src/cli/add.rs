use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, anyhow};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use regex::Regex;
use tokio::task::spawn_blocking;
use walkdir::WalkDir;

use crate::FaceDB;
use crate::archive::{ArchiveEntry, read_archive};
use crate::bulk::{extract_entries, select_registrations};
use crate::cli::SubCommandExtend;
use crate::config::{ExtractorOptions, Opts};
use crate::extractor::{CommandExtractor, FaceExtractor};

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    #[command(flatten)]
    pub extractor: ExtractorOptions,
    /// 单张图片、图片所在目录或 ZIP/tar 归档，文件名（不含扩展名）即人名
    pub path: PathBuf,
    /// 扫描目录时的文件后缀名，多个后缀用逗号分隔
    #[arg(short, long, default_value = "jpg,jpeg,png")]
    pub suffix: String,
}

impl SubCommandExtend for AddCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let db = FaceDB::open(&opts.db).await?;
        let extractor: Arc<dyn FaceExtractor> = Arc::new(CommandExtractor::from(&self.extractor));

        let entries = if self.path.is_dir() {
            let re_suf = format!("(?i)^({})$", self.suffix.replace(',', "|"));
            let re_suf = Regex::new(&re_suf)?;
            scan_directory(&self.path, &re_suf).await?
        } else if is_archive(&self.path) {
            read_archive(tokio::fs::read(&self.path).await?).await?
        } else {
            return add_single(&db, extractor, &self.path, opts).await;
        };
        info!("共 {} 张图片", entries.len());

        let pb = ProgressBar::new(entries.len() as u64).with_style(pb_style());
        let images = extract_entries(extractor, entries, |name| {
            pb.set_message(name.to_owned());
            pb.inc(1);
        })
        .await?;
        pb.finish_with_message("特征提取完成");

        let faces = select_registrations(images);
        db.register_batch(&opts.db.population, &faces).await?;

        Ok(())
    }
}

async fn add_single(
    db: &FaceDB,
    extractor: Arc<dyn FaceExtractor>,
    path: &Path,
    opts: &Opts,
) -> Result<()> {
    let filename = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .ok_or_else(|| anyhow!("无效的文件路径: {}", path.display()))?;
    let data = tokio::fs::read(path).await?;

    let descriptors = spawn_blocking(move || extractor.extract(&data)).await??;
    let descriptor = descriptors.first().ok_or_else(|| anyhow!("图片中没有检测到人脸: {}", path.display()))?;

    let id = db.register(&opts.db.population, &filename, descriptor).await?;
    println!("{id}\t{filename}");
    Ok(())
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tar") || ext.eq_ignore_ascii_case("zip"))
}

async fn scan_directory(path: &Path, re_suf: &Regex) -> Result<Vec<ArchiveEntry>> {
    info!("开始扫描目录: {}", path.display());
    let mut entries = vec![];
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(ext) = path.extension() else {
            continue;
        };
        if !re_suf.is_match(&ext.to_string_lossy()) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        let data = tokio::fs::read(path).await?;
        entries.push(ArchiveEntry { name, data });
    }
    Ok(entries)
}

fn pb_style() -> ProgressStyle {
    ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_archive() {
        assert!(is_archive(Path::new("faces.tar")));
        assert!(is_archive(Path::new("dir/FACES.TAR")));
        assert!(is_archive(Path::new("faces.zip")));
        assert!(!is_archive(Path::new("alice.jpg")));
        assert!(!is_archive(Path::new("tar")));
    }

    #[tokio::test]
    async fn test_scan_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("alice.jpg"), b"a").unwrap();
        std::fs::write(dir.path().join("sub/bob.PNG"), b"b").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"c").unwrap();

        let re = Regex::new("(?i)^(jpg|png)$").unwrap();
        let entries = scan_directory(dir.path(), &re).await.unwrap();
        let names = entries.iter().map(|e| e.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["alice.jpg", "bob.PNG"]);
        assert_eq!(entries[0].data, b"a");
    }
}
