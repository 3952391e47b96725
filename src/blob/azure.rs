//! Azure blob storage over SAS URLs: `Put Block` + `Put Block List` uploads, streamed downloads.

// crates.io
use reqwest::Response;
use tokio::{
	fs::File,
	io::{AsyncReadExt, AsyncWriteExt},
};
// self
use crate::{
	_prelude::*,
	blob::{BlobFuture, BlobTransfer, ProgressSink, TransferDigest, TransferReport, block_id},
	error::BlobError,
	obs::{self, CallKind},
};

/// Upload block size.
pub const DEFAULT_BLOCK_SIZE: usize = 4 * 1024 * 1024;
/// Storage service version sent with every request.
pub const STORAGE_VERSION: &str = "2020-04-08";

const VERSION_HEADER: &str = "x-ms-version";

/// [`BlobTransfer`] backed by reqwest.
#[derive(Clone, Debug)]
pub struct AzureBlobClient {
	client: ReqwestClient,
	block_size: usize,
}
impl AzureBlobClient {
	/// Wraps `client`.
	pub fn new(client: ReqwestClient) -> Self {
		Self { client, block_size: DEFAULT_BLOCK_SIZE }
	}

	/// Overrides the upload block size (minimum 1 byte).
	pub fn with_block_size(mut self, block_size: usize) -> Self {
		self.block_size = block_size.max(1);

		self
	}

	async fn download_to(
		&self,
		url: &Url,
		destination: &Path,
		progress: &dyn ProgressSink,
	) -> Result<TransferReport> {
		let mut response = self.get(url, "download").await?;
		let total = response.content_length();
		let mut file = File::create(destination).await.map_err(|e| file_error(destination, e))?;
		let mut digest = TransferDigest::default();

		while let Some(chunk) = response.chunk().await.map_err(BlobError::from)? {
			file.write_all(&chunk).await.map_err(|e| file_error(destination, e))?;
			digest.update(&chunk);
			progress.report(digest.bytes(), total);
		}

		file.flush().await.map_err(|e| file_error(destination, e))?;
		progress.finish();

		Ok(digest.finish())
	}

	async fn upload_from(
		&self,
		source: &Path,
		url: &Url,
		progress: &dyn ProgressSink,
	) -> Result<TransferReport> {
		let mut file = File::open(source).await.map_err(|e| file_error(source, e))?;
		let total = file.metadata().await.map_err(|e| file_error(source, e))?.len();
		let mut digest = TransferDigest::default();
		let mut block_ids = Vec::new();
		let mut buffer = vec![0; self.block_size];

		loop {
			let filled = read_block(&mut file, &mut buffer).await.map_err(|e| file_error(source, e))?;

			if filled == 0 {
				break;
			}

			let id = block_id(block_ids.len() as u32);
			let mut block_url = url.clone();

			block_url.query_pairs_mut().append_pair("comp", "block").append_pair("blockid", &id);

			let response = self
				.client
				.put(block_url)
				.header(VERSION_HEADER, STORAGE_VERSION)
				.body(buffer[..filled].to_vec())
				.send()
				.await
				.map_err(BlobError::from)?;

			ensure_success("put block", response).await?;
			digest.update(&buffer[..filled]);
			block_ids.push(id);
			progress.report(digest.bytes(), Some(total));
		}

		let mut list_url = url.clone();

		list_url.query_pairs_mut().append_pair("comp", "blocklist");

		let response = self
			.client
			.put(list_url)
			.header(VERSION_HEADER, STORAGE_VERSION)
			.header(header::CONTENT_TYPE, "application/xml")
			.body(block_list_xml(&block_ids))
			.send()
			.await
			.map_err(BlobError::from)?;

		ensure_success("put block list", response).await?;
		progress.finish();

		Ok(digest.finish())
	}

	async fn fetch_text(&self, url: &Url) -> Result<String> {
		let response = self.get(url, "download").await?;

		Ok(response.text().await.map_err(BlobError::from)?)
	}

	async fn get(&self, url: &Url, operation: &'static str) -> Result<Response> {
		let response = self
			.client
			.get(url.clone())
			.header(VERSION_HEADER, STORAGE_VERSION)
			.send()
			.await
			.map_err(BlobError::from)?;

		ensure_success(operation, response).await
	}
}
impl Default for AzureBlobClient {
	fn default() -> Self {
		Self::new(ReqwestClient::default())
	}
}
impl BlobTransfer for AzureBlobClient {
	fn download<'a>(
		&'a self,
		url: &'a Url,
		destination: &'a Path,
		progress: &'a dyn ProgressSink,
	) -> BlobFuture<'a, TransferReport> {
		Box::pin(obs::observe(CallKind::Blob, "download", self.download_to(url, destination, progress)))
	}

	fn upload<'a>(
		&'a self,
		source: &'a Path,
		url: &'a Url,
		progress: &'a dyn ProgressSink,
	) -> BlobFuture<'a, TransferReport> {
		Box::pin(obs::observe(CallKind::Blob, "upload", self.upload_from(source, url, progress)))
	}

	fn download_text<'a>(&'a self, url: &'a Url) -> BlobFuture<'a, String> {
		Box::pin(obs::observe(CallKind::Blob, "download_text", self.fetch_text(url)))
	}
}

/// `<BlockList>` body committing `ids` in order.
pub fn block_list_xml(ids: &[String]) -> String {
	let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?><BlockList>");

	for id in ids {
		xml.push_str("<Latest>");
		xml.push_str(id);
		xml.push_str("</Latest>");
	}

	xml.push_str("</BlockList>");

	xml
}

async fn ensure_success(operation: &'static str, response: Response) -> Result<Response> {
	let status = response.status();

	if status.is_success() {
		return Ok(response);
	}

	let body = response.text().await.unwrap_or_default();

	Err(BlobError::Status { operation, status: status.as_u16(), body }.into())
}

async fn read_block(file: &mut File, buffer: &mut [u8]) -> std::io::Result<usize> {
	let mut filled = 0;

	while filled < buffer.len() {
		let read = file.read(&mut buffer[filled..]).await?;

		if read == 0 {
			break;
		}

		filled += read;
	}

	Ok(filled)
}

fn file_error(path: &Path, source: std::io::Error) -> BlobError {
	BlobError::File { path: path.to_owned(), source }
}
