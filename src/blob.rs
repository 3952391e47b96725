//! Package transfers against pre-signed blob storage URLs.
//!
//! [`BlobTransfer`] is the seam the poller and CLI call; [`AzureBlobClient`] implements it with block
//! uploads and streamed downloads. Transfers are never retried here.

#[cfg(feature = "reqwest")] pub mod azure;

#[cfg(feature = "reqwest")] pub use azure::*;

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Boxed future returned by [`BlobTransfer`] operations.
pub type BlobFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Receives byte counts while a transfer runs.
pub trait ProgressSink
where
	Self: Send + Sync,
{
	/// Called after each chunk; `total` is known for uploads and for downloads with a length header.
	fn report(&self, transferred: u64, total: Option<u64>);

	/// Called once the transfer completes.
	fn finish(&self) {}
}

/// Sink that discards progress.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;
impl ProgressSink for NoProgress {
	fn report(&self, _: u64, _: Option<u64>) {}
}

/// Summary of a completed transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferReport {
	/// Bytes moved.
	pub bytes: u64,
	/// Lower-case hex SHA-256 of the bytes moved.
	pub sha256: String,
}

/// Upload and download of blobs behind pre-signed URLs.
pub trait BlobTransfer
where
	Self: Send + Sync,
{
	/// Streams `url` into a new file at `destination`.
	fn download<'a>(
		&'a self,
		url: &'a Url,
		destination: &'a Path,
		progress: &'a dyn ProgressSink,
	) -> BlobFuture<'a, TransferReport>;

	/// Uploads `source` to `url`.
	fn upload<'a>(
		&'a self,
		source: &'a Path,
		url: &'a Url,
		progress: &'a dyn ProgressSink,
	) -> BlobFuture<'a, TransferReport>;

	/// Fetches a small text blob (error reports, driver metadata).
	fn download_text<'a>(&'a self, url: &'a Url) -> BlobFuture<'a, String>;
}
impl<B> BlobTransfer for Arc<B>
where
	B: ?Sized + BlobTransfer,
{
	fn download<'a>(
		&'a self,
		url: &'a Url,
		destination: &'a Path,
		progress: &'a dyn ProgressSink,
	) -> BlobFuture<'a, TransferReport> {
		(**self).download(url, destination, progress)
	}

	fn upload<'a>(
		&'a self,
		source: &'a Path,
		url: &'a Url,
		progress: &'a dyn ProgressSink,
	) -> BlobFuture<'a, TransferReport> {
		(**self).upload(source, url, progress)
	}

	fn download_text<'a>(&'a self, url: &'a Url) -> BlobFuture<'a, String> {
		(**self).download_text(url)
	}
}

/// Block id for the `index`-th block; every id of one blob has the same encoded length.
pub fn block_id(index: u32) -> String {
	STANDARD.encode(format!("block-{index:010}"))
}

/// Running SHA-256 over transferred bytes.
#[derive(Clone, Default)]
pub struct TransferDigest {
	hasher: Sha256,
	bytes: u64,
}
impl TransferDigest {
	/// Feeds a chunk.
	pub fn update(&mut self, chunk: &[u8]) {
		self.hasher.update(chunk);
		self.bytes += chunk.len() as u64;
	}

	/// Bytes fed so far.
	pub fn bytes(&self) -> u64 {
		self.bytes
	}

	/// Finalizes into a [`TransferReport`].
	pub fn finish(self) -> TransferReport {
		let sha256 = hex::encode(self.hasher.finalize());

		TransferReport { bytes: self.bytes, sha256 }
	}
}
impl Debug for TransferDigest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TransferDigest").field("bytes", &self.bytes).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn block_ids_share_one_length_and_are_distinct() {
		let ids = [0, 1, 99, 4_000_000].map(block_id);

		assert!(ids.iter().all(|id| id.len() == ids[0].len()));
		assert_eq!(STANDARD.decode(&ids[2]).expect("Block id should be base64."), b"block-0000000099");
		assert_ne!(ids[0], ids[1]);
	}

	#[test]
	fn digest_matches_known_vector() {
		let mut digest = TransferDigest::default();

		digest.update(b"a");
		digest.update(b"bc");

		let report = digest.finish();

		assert_eq!(report.bytes, 3);
		assert_eq!(
			report.sha256,
			"ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
		);
	}
}
