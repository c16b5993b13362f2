use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::debug;
use tokio::task::spawn_blocking;

use crate::FaceDB;
use crate::cli::SubCommandExtend;
use crate::config::{ExtractorOptions, Opts, SearchOptions};
use crate::db::FaceMatches;
use crate::extractor::{CommandExtractor, FaceExtractor};

#[derive(Parser, Debug, Clone)]
pub struct SearchCommand {
    #[command(flatten)]
    pub extractor: ExtractorOptions,
    #[command(flatten)]
    pub search: SearchOptions,
    /// 被搜索的图片路径
    pub image: PathBuf,
    /// 输出格式
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for SearchCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let data = tokio::fs::read(&self.image).await?;
        let extractor = CommandExtractor::from(&self.extractor);
        let descriptors = spawn_blocking(move || extractor.extract(&data)).await??;
        debug!("检测到 {} 张人脸", descriptors.len());

        let db = FaceDB::open(&opts.db).await?;

        let mut result = Vec::with_capacity(descriptors.len());
        for descriptor in &descriptors {
            let matches = db
                .search(&opts.db.population, descriptor, self.search.k, self.search.confidence)
                .await?;
            result.push(matches);
        }

        print_result(&FaceMatches(result), self.output_format)
    }
}

fn print_result(result: &FaceMatches, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        OutputFormat::Table => {
            for (key, matches) in result.iter() {
                println!("{key}");
                for m in matches {
                    println!("{}\t{}", m.id, m.person_name);
                }
            }
        }
    }
    Ok(())
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Table,
}
