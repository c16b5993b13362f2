use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow};
use log::debug;

use crate::config::ExtractorOptions;
use crate::encoding::FaceDescriptor;

/// 人脸特征提取器，返回图片中每张人脸的特征向量
pub trait FaceExtractor: Send + Sync {
    fn extract(&self, image: &[u8]) -> Result<Vec<FaceDescriptor>>;
}

/// 调用外部程序提取特征
///
/// 图片数据写入子进程 stdin，子进程向 stdout 输出形如 `[[f64; 128], ...]` 的 JSON。
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
}

impl CommandExtractor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self { program: program.into(), args }
    }
}

impl From<&ExtractorOptions> for CommandExtractor {
    fn from(opts: &ExtractorOptions) -> Self {
        Self::new(opts.extractor.clone(), opts.extractor_args.clone())
    }
}

impl FaceExtractor for CommandExtractor {
    fn extract(&self, image: &[u8]) -> Result<Vec<FaceDescriptor>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("无法启动特征提取程序 {}", self.program))?;

        // NOTE: 写入必须放在单独的线程里，和读取 stdout/stderr 同时进行，
        // 否则双方的管道缓冲区写满后会互相等待。写完后关闭 stdin，子进程才能读到 EOF
        let mut stdin = child.stdin.take().ok_or_else(|| anyhow!("无法打开子进程 stdin"))?;
        let (written, output) = std::thread::scope(|s| {
            let writer = s.spawn(move || match stdin.write_all(image) {
                // 子进程不读完输入就退出，交给退出码判断
                Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                r => r,
            });
            let output = child.wait_with_output();
            (writer.join(), output)
        });
        let output = output?;
        let written = written.map_err(|_| anyhow!("写入子进程 stdin 的线程异常退出"))?;

        if !output.status.success() {
            return Err(anyhow!(
                "特征提取程序退出异常 ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        written.context("无法写入特征提取程序的 stdin")?;

        let descriptors = parse_descriptors(&output.stdout)?;
        debug!("提取到 {} 张人脸", descriptors.len());
        Ok(descriptors)
    }
}

/// 解析特征提取程序的输出
pub fn parse_descriptors(output: &[u8]) -> Result<Vec<FaceDescriptor>> {
    serde_json::from_slice(output).context("无法解析特征提取程序的输出")
}
