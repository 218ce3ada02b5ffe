//! TCP `Transport` implementation: length-prefixed `serde_json` envelopes
//! over a plain `TcpStream`. Bulk file payloads above `MAX_CHUNK_SIZE` are
//! split into content-defined chunks via `rollsum` and reassembled on the
//! other end — that bulk-transfer scheme is purely an implementation detail
//! of this module and never appears in the `Transport` trait itself.

use crate::chunking::{ChunkConfig, MAX_CHUNK_SIZE};
use crate::error::TransportError;
use crate::model::PeerSnapshot;
use crate::transport::traits::{Transport, TransportResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

const MAX_ENVELOPE_BYTES: u32 = 512 * 1024 * 1024;

#[derive(Serialize, Deserialize)]
enum Request {
	GetStates { sync_id: String },
	GetFile { sync_id: String, path: PathBuf },
	PutFile { sync_id: String, path: PathBuf, chunks: Vec<Vec<u8>> },
	DeleteFiles { sync_id: String, paths: Vec<PathBuf> },
}

#[derive(Serialize, Deserialize)]
enum Response {
	States(PeerSnapshot),
	File { chunks: Vec<Vec<u8>> },
	Ack,
	NotFound { path: String },
	Err { message: String },
}

async fn write_envelope<T: Serialize>(stream: &mut TcpStream, value: &T) -> std::io::Result<()> {
	let bytes = serde_json::to_vec(value).map_err(std::io::Error::other)?;
	stream.write_u32(bytes.len() as u32).await?;
	stream.write_all(&bytes).await
}

async fn read_envelope<T: for<'de> Deserialize<'de>>(stream: &mut TcpStream) -> std::io::Result<T> {
	let len = stream.read_u32().await?;
	if len > MAX_ENVELOPE_BYTES {
		return Err(std::io::Error::other(format!(
			"envelope of {} bytes exceeds {} byte limit",
			len, MAX_ENVELOPE_BYTES
		)));
	}
	let mut buf = vec![0u8; len as usize];
	stream.read_exact(&mut buf).await?;
	serde_json::from_slice(&buf).map_err(std::io::Error::other)
}

/// Splits `data` into content-defined chunks using a rolling hash, bounded
/// by `ChunkConfig`. Kept internal: callers of `Transport` never see chunks.
fn split_chunks(data: &[u8], cfg: &ChunkConfig) -> Vec<Vec<u8>> {
	if data.len() <= cfg.min_chunk_size {
		return vec![data.to_vec()];
	}
	let mut chunks = Vec::new();
	let mut start = 0usize;
	let mut roll = rollsum::Bup::new_with_chunk_bits(cfg.chunk_bits);
	for (i, &byte) in data.iter().enumerate() {
		roll.roll_byte(byte);
		let since_start = i + 1 - start;
		if (roll.bits() && since_start >= cfg.min_chunk_size) || since_start >= cfg.max_chunk_size {
			chunks.push(data[start..=i].to_vec());
			start = i + 1;
			roll = rollsum::Bup::new_with_chunk_bits(cfg.chunk_bits);
		}
	}
	if start < data.len() {
		chunks.push(data[start..].to_vec());
	}
	chunks
}

fn join_chunks(chunks: Vec<Vec<u8>>) -> Vec<u8> {
	chunks.into_iter().flatten().collect()
}

/// A connection to one peer over TCP. Requests are serialized through a
/// mutex since one peer only ever maintains a single logical connection
/// per SyncSession.
pub struct TcpTransport {
	stream: Mutex<TcpStream>,
	chunk_cfg: ChunkConfig,
}

impl TcpTransport {
	pub async fn connect(addr: &str) -> TransportResult<Self> {
		let stream = TcpStream::connect(addr).await.map_err(|e| TransportError::ConnectionFailed {
			peer: addr.to_string(),
			source: Box::new(e),
		})?;
		Ok(TcpTransport { stream: Mutex::new(stream), chunk_cfg: ChunkConfig::default() })
	}

	async fn roundtrip(&self, req: Request) -> TransportResult<Response> {
		let mut stream = self.stream.lock().await;
		write_envelope(&mut stream, &req)
			.await
			.map_err(|e| TransportError::Protocol { message: e.to_string() })?;
		read_envelope(&mut stream).await.map_err(|e| TransportError::Protocol { message: e.to_string() })
	}
}

#[async_trait]
impl Transport for TcpTransport {
	async fn get_states(&self, sync_id: &str) -> TransportResult<PeerSnapshot> {
		match self.roundtrip(Request::GetStates { sync_id: sync_id.to_string() }).await? {
			Response::States(s) => Ok(s),
			Response::Err { message } => Err(TransportError::Protocol { message }),
			_ => Err(TransportError::Protocol { message: "unexpected response to GetStates".into() }),
		}
	}

	async fn get_file(&self, sync_id: &str, path: &Path) -> TransportResult<Vec<u8>> {
		match self
			.roundtrip(Request::GetFile { sync_id: sync_id.to_string(), path: path.to_path_buf() })
			.await?
		{
			Response::File { chunks } => Ok(join_chunks(chunks)),
			Response::NotFound { path } => Err(TransportError::NotFound { path }),
			Response::Err { message } => Err(TransportError::Protocol { message }),
			_ => Err(TransportError::Protocol { message: "unexpected response to GetFile".into() }),
		}
	}

	async fn put_file(&self, sync_id: &str, path: &Path, bytes: &[u8]) -> TransportResult<()> {
		let chunks = if bytes.len() > MAX_CHUNK_SIZE {
			split_chunks(bytes, &self.chunk_cfg)
		} else {
			vec![bytes.to_vec()]
		};
		match self
			.roundtrip(Request::PutFile {
				sync_id: sync_id.to_string(),
				path: path.to_path_buf(),
				chunks,
			})
			.await?
		{
			Response::Ack => Ok(()),
			Response::Err { message } => Err(TransportError::Protocol { message }),
			_ => Err(TransportError::Protocol { message: "unexpected response to PutFile".into() }),
		}
	}

	async fn delete_files(&self, sync_id: &str, paths: &[PathBuf]) -> TransportResult<()> {
		match self
			.roundtrip(Request::DeleteFiles { sync_id: sync_id.to_string(), paths: paths.to_vec() })
			.await?
		{
			Response::Ack => Ok(()),
			Response::Err { message } => Err(TransportError::Protocol { message }),
			_ => Err(TransportError::Protocol { message: "unexpected response to DeleteFiles".into() }),
		}
	}
}

/// Serves TCP transport requests for `sync_id` against `store`/`root`,
/// using `self_peer` as the version-vector identity for writes it applies
/// on this side (see `transport::inmemory` for why that is correct).
pub async fn serve_connection(
	mut stream: TcpStream,
	store: std::sync::Arc<crate::store::Store>,
	root: PathBuf,
	self_peer: crate::vv::PeerId,
) -> std::io::Result<()> {
	loop {
		let req: Request = match read_envelope(&mut stream).await {
			Ok(r) => r,
			Err(_) => return Ok(()),
		};
		let response = handle_request(req, &store, &root, self_peer).await;
		write_envelope(&mut stream, &response).await?;
	}
}

async fn handle_request(
	req: Request,
	store: &crate::store::Store,
	root: &Path,
	self_peer: crate::vv::PeerId,
) -> Response {
	match req {
		Request::GetStates { sync_id } => match store.iter(&sync_id) {
			Ok(entries) => {
				Response::States(PeerSnapshot { sync_id, states: entries.into_iter().collect() })
			}
			Err(e) => Response::Err { message: e.to_string() },
		},
		Request::GetFile { sync_id: _, path } => {
			let abs = root.join(&path);
			match tokio::fs::read(&abs).await {
				Ok(data) => {
					let cfg = ChunkConfig::default();
					let chunks = if data.len() > MAX_CHUNK_SIZE {
						split_chunks(&data, &cfg)
					} else {
						vec![data]
					};
					Response::File { chunks }
				}
				Err(_) => Response::NotFound { path: path.display().to_string() },
			}
		}
		Request::PutFile { sync_id, path, chunks } => {
			let bytes = join_chunks(chunks);
			let prior_vv = store
				.get(&sync_id, &path)
				.ok()
				.flatten()
				.map(|s| s.vv().clone())
				.unwrap_or_default();
			let mut vv = prior_vv;
			vv.inc(self_peer);
			let meta = crate::model::FileMetadata {
				content_hash: crate::util::hash_binary(&bytes),
				mtime_unix_ms: std::time::SystemTime::now()
					.duration_since(std::time::UNIX_EPOCH)
					.unwrap_or_default()
					.as_millis() as i64,
				size: bytes.len() as u64,
				vv,
				is_directory: false,
			};
			match store
				.atomic_apply_remote(
					&sync_id,
					root,
					&path,
					&crate::model::FileState::Live(meta),
					Some(&bytes),
				)
				.await
			{
				Ok(()) => Response::Ack,
				Err(e) => Response::Err { message: e.to_string() },
			}
		}
		Request::DeleteFiles { sync_id, paths } => {
			let now = std::time::SystemTime::now()
				.duration_since(std::time::UNIX_EPOCH)
				.unwrap_or_default()
				.as_millis() as i64;
			for path in paths {
				if let Err(e) = store.atomic_delete_local(&sync_id, root, &path, self_peer, now).await {
					return Response::Err { message: e.to_string() };
				}
			}
			Response::Ack
		}
	}
}
