use anyhow::Result;
use clap::Parser;

use crate::FaceDB;
use crate::cli::SubCommandExtend;
use crate::config::Opts;

#[derive(Parser, Debug, Clone)]
pub struct InfoCommand {
    /// 人脸 ID
    pub id: i64,
}

impl SubCommandExtend for InfoCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let db = FaceDB::open(&opts.db).await?;
        let info = db.face_info(&opts.db.population, self.id).await?.unwrap_or_default();
        println!("{}", serde_json::to_string_pretty(&info)?);
        Ok(())
    }
}
