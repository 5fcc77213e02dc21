//! The remote workspace file service.
//!
//! The controller only ever talks to the [`FileService`] trait; the
//! production implementation is a blocking HTTP client with a per-request
//! timeout. Blocking is deliberate where the caller needs the response
//! before returning (the file-open flow); everything else runs the client
//! from the background worker.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::{multipart, Client};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, TreeNavError};
use crate::protocol::{
    CreateRequest, Envelope, FileContent, FileResponse, FoundMatch, ListResponse, NodeKind,
    NodePayload, PathRequest, RefreshResponse, RenameRequest, SearchRequest, SearchResponse,
};

pub trait FileService: Send + Sync {
    /// `POST /files`: the whole workspace forest.
    fn list_tree(&self) -> Result<Vec<NodePayload>>;

    /// `POST /file/refresh`: re-fetch one directory's children.
    fn refresh(&self, path: &str) -> Result<Vec<NodePayload>>;

    /// `POST /file`: file content keyed by path.
    fn read_file(&self, path: &str) -> Result<FileContent>;

    /// `POST /file/zip/new`: ask the server to build an archive for `path`.
    fn create_archive(&self, path: &str) -> Result<()>;

    /// `GET /file/zip?path=<path>.zip`: fetch a built archive; returns the
    /// local file it was saved to.
    fn download_archive(&self, path: &str) -> Result<PathBuf>;

    /// Multipart `POST /file/upload?path=<dir>`: upload local files into a
    /// workspace directory.
    fn upload(&self, dir: &str, files: &[PathBuf]) -> Result<()>;

    /// `POST /file/search/text`.
    fn search_text(&self, dir: &str, text: &str, extension: &str) -> Result<Vec<FoundMatch>>;

    /// `POST /file/new`.
    fn create_entry(&self, path: &str, kind: NodeKind) -> Result<()>;

    /// `POST /file/remove`.
    fn remove_entry(&self, path: &str) -> Result<()>;

    /// `POST /file/rename`.
    fn rename_entry(&self, path: &str, new_path: &str) -> Result<()>;
}

pub struct HttpFileService {
    base_url: String,
    client: Client,
    download_dir: PathBuf,
}

impl HttpFileService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let download_dir = dirs::download_dir().unwrap_or_else(std::env::temp_dir);
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            download_dir,
        })
    }

    pub fn with_download_dir(mut self, dir: PathBuf) -> Self {
        self.download_dir = dir;
        self
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(&self, route: &str, body: &B) -> Result<T> {
        let response = self
            .client
            .post(self.url(route))
            .json(body)
            .send()?
            .error_for_status()?;
        Ok(response.json()?)
    }

    fn expect_succ(envelope: Envelope) -> Result<()> {
        if envelope.succ {
            Ok(())
        } else {
            Err(TreeNavError::Server(envelope.msg))
        }
    }
}

impl FileService for HttpFileService {
    fn list_tree(&self) -> Result<Vec<NodePayload>> {
        let resp: ListResponse = self.post_json("/files", &PathRequest::new(""))?;
        if !resp.succ {
            return Err(TreeNavError::Server(resp.msg));
        }
        Ok(resp.root.map(|r| r.children).unwrap_or_default())
    }

    fn refresh(&self, path: &str) -> Result<Vec<NodePayload>> {
        let resp: RefreshResponse = self.post_json("/file/refresh", &PathRequest::new(path))?;
        if !resp.succ {
            return Err(TreeNavError::Server(resp.msg));
        }
        Ok(resp.children)
    }

    fn read_file(&self, path: &str) -> Result<FileContent> {
        let resp: FileResponse = self.post_json("/file", &PathRequest::new(path))?;
        if !resp.succ {
            return Err(TreeNavError::Server(resp.msg));
        }
        Ok(resp.into())
    }

    fn create_archive(&self, path: &str) -> Result<()> {
        let envelope: Envelope = self.post_json("/file/zip/new", &PathRequest::new(path))?;
        Self::expect_succ(envelope)
    }

    fn download_archive(&self, path: &str) -> Result<PathBuf> {
        let archive = format!("{}.zip", path);
        let file_name = Path::new(&archive)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "archive.zip".to_string());
        let dest = self.download_dir.join(file_name);

        let mut response = self
            .client
            .get(self.url("/file/zip"))
            .query(&[("path", archive.as_str())])
            .send()?
            .error_for_status()?;

        std::fs::create_dir_all(&self.download_dir)?;
        let mut out = File::create(&dest)?;
        response.copy_to(&mut out)?;
        Ok(dest)
    }

    fn upload(&self, dir: &str, files: &[PathBuf]) -> Result<()> {
        let mut form = multipart::Form::new().text("path", dir.to_string());
        for file in files {
            form = form.file("files[]", file)?;
        }

        self.client
            .post(self.url("/file/upload"))
            .query(&[("path", dir)])
            .multipart(form)
            .send()?
            .error_for_status()?;
        Ok(())
    }

    fn search_text(&self, dir: &str, text: &str, extension: &str) -> Result<Vec<FoundMatch>> {
        let request = SearchRequest {
            dir: dir.to_string(),
            text: text.to_string(),
            extension: extension.to_string(),
        };
        let resp: SearchResponse = self.post_json("/file/search/text", &request)?;
        if !resp.succ {
            return Err(TreeNavError::Server(resp.msg));
        }
        Ok(resp.founds)
    }

    fn create_entry(&self, path: &str, kind: NodeKind) -> Result<()> {
        let request = CreateRequest {
            path: path.to_string(),
            kind,
        };
        let envelope: Envelope = self.post_json("/file/new", &request)?;
        Self::expect_succ(envelope)
    }

    fn remove_entry(&self, path: &str) -> Result<()> {
        let envelope: Envelope = self.post_json("/file/remove", &PathRequest::new(path))?;
        Self::expect_succ(envelope)
    }

    fn rename_entry(&self, path: &str, new_path: &str) -> Result<()> {
        let request = RenameRequest {
            path: path.to_string(),
            new_path: new_path.to_string(),
        };
        let envelope: Envelope = self.post_json("/file/rename", &request)?;
        Self::expect_succ(envelope)
    }
}
