//! FTP (RFC 959) transport agent. Opens a fresh control connection per
//! operation rather than holding one open across ticks — the pipeline only
//! calls an agent a handful of times per interval, and a short-lived
//! connection sidesteps stale-session reconnect logic entirely.

use crate::agent::{Agent, RemoteFile};
use crate::error::Result;
use ach_types::FileTransferConfig;
use async_trait::async_trait;
use suppaftp::AsyncFtpStream;

pub struct FtpAgent {
    config: FileTransferConfig,
}

impl FtpAgent {
    pub fn new(config: FileTransferConfig) -> Self {
        Self { config }
    }

    async fn connect(&self) -> Result<AsyncFtpStream> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let mut stream = AsyncFtpStream::connect(addr).await?;
        stream.login(&self.config.username, self.config.password.as_deref().unwrap_or("")).await?;
        Ok(stream)
    }

    async fn list_dir(&self, dir: &str) -> Result<Vec<RemoteFile>> {
        let mut stream = self.connect().await?;
        stream.cwd(dir).await?;
        let names = stream.nlst(None).await?;
        let mut out = Vec::with_capacity(names.len());
        for name in names {
            let cursor = stream.retr_as_buffer(&name).await?;
            out.push(RemoteFile { filename: name, contents: cursor.into_inner() });
        }
        let _ = stream.quit().await;
        Ok(out)
    }
}

#[async_trait]
impl Agent for FtpAgent {
    async fn get_inbound_files(&self) -> Result<Vec<RemoteFile>> {
        self.list_dir(&self.config.inbound_path).await
    }

    async fn get_return_files(&self) -> Result<Vec<RemoteFile>> {
        self.list_dir(&self.config.return_path).await
    }

    async fn upload_file(&self, filename: &str, contents: &[u8]) -> Result<()> {
        let mut stream = self.connect().await?;
        stream.cwd(&self.config.outbound_path).await?;
        let mut reader = std::io::Cursor::new(contents.to_vec());
        stream.put_file(filename, &mut reader).await?;
        let _ = stream.quit().await;
        tracing::debug!(host = %self.config.host, filename, bytes = contents.len(), "uploaded file over ftp");
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let mut stream = self.connect().await?;
        match stream.rm(path).await {
            Ok(()) => {}
            Err(suppaftp::FtpError::UnexpectedResponse(_)) => {
                tracing::debug!(host = %self.config.host, path, "ftp delete of absent file treated as success");
            }
            Err(e) => return Err(e.into()),
        }
        let _ = stream.quit().await;
        Ok(())
    }

    fn hostname(&self) -> &str {
        &self.config.host
    }
}
