use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::cli::*;
use crate::db::Population;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// PostgreSQL + cube 扩展
    Postgres,
    /// 内存存储，进程退出后数据丢失，用于调试
    Memory,
}

#[derive(Args, Debug, Clone)]
pub struct DatabaseOptions {
    /// 存储后端
    #[arg(long, value_enum, default_value_t = StoreKind::Postgres)]
    pub store: StoreKind,
    /// 数据库地址
    #[arg(long, env = "FACESEARCH_DB_HOST", default_value = "localhost")]
    pub db_host: String,
    /// 数据库端口
    #[arg(long, env = "FACESEARCH_DB_PORT", default_value_t = 5432)]
    pub db_port: u16,
    /// 数据库名
    #[arg(long, env = "FACESEARCH_DB_NAME", default_value = "facesearch")]
    pub db_name: String,
    /// 数据库用户名
    #[arg(long, env = "FACESEARCH_DB_USER", default_value = "postgres")]
    pub db_user: String,
    /// 数据库密码
    #[arg(long, env = "FACESEARCH_DB_PASSWORD", default_value = "", hide_env_values = true)]
    pub db_password: String,
    /// 连接池最大连接数
    #[arg(long, value_name = "N", default_value_t = 5)]
    pub max_connections: u32,
    /// 人脸表名
    #[arg(short, long, value_name = "TABLE", default_value = "face")]
    pub population: Population,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            store: StoreKind::Memory,
            db_host: "localhost".to_owned(),
            db_port: 5432,
            db_name: "facesearch".to_owned(),
            db_user: "postgres".to_owned(),
            db_password: String::new(),
            max_connections: 5,
            population: Population::default(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct SearchOptions {
    /// 每张人脸返回的最大结果数量
    #[arg(short, value_name = "K", default_value_t = 5)]
    pub k: i64,
    /// 两个特征向量允许的最大欧氏距离，越小越严格
    #[arg(long, value_name = "DISTANCE", default_value_t = 0.6, value_parser = parse_confidence)]
    pub confidence: f64,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractorOptions {
    /// 人脸特征提取程序，从 stdin 读取图片，向 stdout 输出 JSON 格式的特征向量数组
    #[arg(long, value_name = "PROGRAM", env = "FACESEARCH_EXTRACTOR", default_value = "face-encoder")]
    pub extractor: String,
    /// 传给特征提取程序的参数，可多次指定
    #[arg(long = "extractor-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub extractor_args: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "facesearch", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    #[command(flatten)]
    pub db: DatabaseOptions,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 添加人脸到数据库，支持单张图片、目录和 ZIP/tar 归档
    Add(AddCommand),
    /// 搜索图片中的人脸
    Search(SearchCommand),
    /// 查询人脸信息
    Info(InfoCommand),
    /// 更新人脸元数据
    Update(UpdateCommand),
    /// 启动 HTTP 服务
    Server(ServerCommand),
}

pub fn parse_confidence(s: &str) -> anyhow::Result<f64> {
    let confidence: f64 = s.parse()?;
    if !(confidence >= 0.) {
        return Err(anyhow::anyhow!("距离阈值不能为负数: {}", s));
    }
    Ok(confidence)
}
