//! SFTP (SSH File Transfer Protocol) transport agent. `ssh2` is a blocking
//! binding to libssh2; every operation runs inside `spawn_blocking` so it
//! doesn't stall the controller's async runtime while the handshake or a
//! transfer is in flight.

use crate::agent::{Agent, RemoteFile};
use crate::error::{Result, TransportError};
use ach_types::FileTransferConfig;
use async_trait::async_trait;
use ssh2::Session;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::Path;

pub struct SftpAgent {
    config: FileTransferConfig,
}

impl SftpAgent {
    pub fn new(config: FileTransferConfig) -> Self {
        Self { config }
    }

    fn connect(config: &FileTransferConfig) -> Result<Session> {
        let addr = format!("{}:{}", config.host, config.port);
        let tcp = TcpStream::connect(&addr)?;
        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        session.handshake()?;

        if let Some(key_path) = &config.private_key_path {
            session.userauth_pubkey_file(&config.username, None, Path::new(key_path), None)?;
        } else {
            session.userauth_password(&config.username, config.password.as_deref().unwrap_or(""))?;
        }
        Ok(session)
    }

    async fn list_dir(&self, dir: String) -> Result<Vec<RemoteFile>> {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<RemoteFile>> {
            let session = Self::connect(&config)?;
            let sftp = session.sftp()?;
            let entries = sftp.readdir(Path::new(&dir))?;
            let mut out = Vec::with_capacity(entries.len());
            for (path, stat) in entries {
                if stat.is_dir() {
                    continue;
                }
                let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
                let mut file = sftp.open(&path)?;
                let mut contents = Vec::new();
                file.read_to_end(&mut contents)?;
                out.push(RemoteFile { filename, contents });
            }
            Ok(out)
        })
        .await?
    }
}

#[async_trait]
impl Agent for SftpAgent {
    async fn get_inbound_files(&self) -> Result<Vec<RemoteFile>> {
        self.list_dir(self.config.inbound_path.clone()).await
    }

    async fn get_return_files(&self) -> Result<Vec<RemoteFile>> {
        self.list_dir(self.config.return_path.clone()).await
    }

    async fn upload_file(&self, filename: &str, contents: &[u8]) -> Result<()> {
        let config = self.config.clone();
        let remote_path = format!("{}/{}", config.outbound_path.trim_end_matches('/'), filename);
        let contents = contents.to_vec();
        let (host, bytes, log_path) = (config.host.clone(), contents.len(), remote_path.clone());
        tokio::task::spawn_blocking(move || -> Result<()> {
            let session = Self::connect(&config)?;
            let sftp = session.sftp()?;
            let mut file = sftp.create(Path::new(&remote_path))?;
            file.write_all(&contents)?;
            Ok(())
        })
        .await??;
        tracing::debug!(host, path = log_path, bytes, "uploaded file over sftp");
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let config = self.config.clone();
        let path = path.to_string();
        let (host, log_path) = (config.host.clone(), path.clone());
        let absent = tokio::task::spawn_blocking(move || -> Result<bool> {
            let session = Self::connect(&config)?;
            let sftp = session.sftp()?;
            match sftp.unlink(Path::new(&path)) {
                Ok(()) => Ok(false),
                Err(e) if e.code() == ssh2::ErrorCode::SFTP(2) => Ok(true), // no such file
                Err(e) => Err(TransportError::Ssh(e)),
            }
        })
        .await??;
        if absent {
            tracing::debug!(host, path = log_path, "sftp delete of absent file treated as success");
        }
        Ok(())
    }

    fn hostname(&self) -> &str {
        &self.config.host
    }
}
