//! OakDB Rust Client SDK — core
//!
//! The in-memory core of a client SDK for OakDB, a distributed document
//! database: the OQL query DSL, the streamed query-response decoder, retry
//! policies, and search-hit aggregation. Sockets, cluster topology and
//! authentication live in collaborator crates and are consumed through the
//! interfaces defined here.
//!
//! # Example
//!
//! ```
//! use oakdb::query::{ident, select, string_literal, Sort};
//!
//! let statement = select(vec![ident("name"), ident("abv")])
//!     .from("beers")
//!     .where_(ident("type").eq(string_literal("ale")))
//!     .order_by(vec![Sort::desc("abv")])
//!     .limit(10);
//!
//! assert_eq!(
//!     statement.render(),
//!     "SELECT name, abv FROM beers WHERE type = 'ale' ORDER BY abv DESC LIMIT 10"
//! );
//! ```
//!
//! Streamed responses are decoded chunk by chunk as the transport delivers
//! them; each response section (rows, errors, signature, metrics) is its own
//! lazy stream:
//!
//! ```no_run
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use oakdb::codec::JsonCodec;
//! use oakdb::response::QueryDecoder;
//!
//! # async fn example() -> oakdb::Result<()> {
//! let (decoder, mut result) = QueryDecoder::streamed("req-42", None, Arc::new(JsonCodec));
//! // ... the transport feeds `decoder` from its read loop ...
//! while let Some(row) = result.rows().next().await {
//!     println!("row: {:?}", row?);
//! }
//! assert!(result.final_success().await?);
//! # Ok(())
//! # }
//! ```

pub mod codec;
mod error;
pub mod query;
pub mod response;
pub mod retry;
pub mod search;

pub use codec::{ChunkCodec, JsonCodec, MsgpackCodec};
pub use error::{Error, ErrorKind, Result};
pub use query::{ident, select, string_literal, Criteria, Expression, Sort, SortDir};
pub use response::{
    ChunkBuffer, QueryChunk, QueryDecoder, QueryError, QueryMetrics, Section, SectionStream,
    StreamedQueryResult,
};
pub use retry::{RetryBuilder, RetryDecision, RetryPolicy};
pub use search::{HitLocation, HitLocations};
