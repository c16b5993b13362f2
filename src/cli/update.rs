use anyhow::{Result, anyhow};
use clap::Parser;
use log::info;

use crate::FaceDB;
use crate::cli::SubCommandExtend;
use crate::config::Opts;
use crate::db::FaceMetadata;

#[derive(Parser, Debug, Clone)]
pub struct UpdateCommand {
    /// 人脸 ID
    pub id: i64,
    /// 版本号
    #[arg(long)]
    pub version_number: String,
    /// 日期
    #[arg(long)]
    pub date: String,
    /// 地点
    #[arg(long)]
    pub location: String,
}

impl SubCommandExtend for UpdateCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let db = FaceDB::open(&opts.db).await?;
        let metadata = FaceMetadata {
            version_number: self.version_number.clone(),
            date: self.date.clone(),
            location: self.location.clone(),
        };
        if !db.update_metadata(&opts.db.population, self.id, &metadata).await? {
            return Err(anyhow!("人脸不存在: {}", self.id));
        }
        info!("更新成功");
        Ok(())
    }
}
