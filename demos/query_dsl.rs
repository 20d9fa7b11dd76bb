//! Build a few OQL statements and decode a simulated streamed response.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use oakdb::query::{ident, insert_into, select, string_literal, update, Criteria, Expression, Sort};
use oakdb::{
    ChunkBuffer, ErrorKind, JsonCodec, QueryChunk, QueryDecoder, RetryBuilder, RetryDecision,
    Section,
};

#[tokio::main]
async fn main() -> oakdb::Result<()> {
    // Statement builders only expose the clauses that are still legal, so a
    // malformed chain does not compile.
    let read = select(vec![ident("name"), ident("abv")])
        .from("beers")
        .where_(ident("type").eq(string_literal("ale")))
        .order_by(vec![Sort::desc("abv")])
        .limit(10);
    println!("read:     {}", read);

    let insert = insert_into("beers")
        .values(string_literal("beer-1"), ident("$doc"))
        .returning(Expression::wildcard());
    println!("insert:   {}", insert);

    let mutation = update("beers")
        .set(ident("abv"), Expression::float(6.5))
        .where_(ident("name").eq(string_literal("amber")));
    println!("update:   {}", mutation);

    let criteria = Criteria::of("type")
        .equal_to("ale")
        .and("abv")
        .between(serde_json::json!([4.5, 7.0]));
    println!("criteria: {}", criteria.render()?);

    // Retry policies are immutable decision rules; the retry loop lives in
    // the transport driver.
    let policy = RetryBuilder::retry_max(3)
        .only_when([ErrorKind::Transport, ErrorKind::Timeout])
        .with_fixed_delay(Duration::from_millis(50))
        .build()?;
    let error = oakdb::Error::Transport("connection reset".into());
    for attempt in 1..=3 {
        match policy.decide(&error, attempt) {
            RetryDecision::Retry(delay) => {
                println!("attempt {}: retry after {:?}", attempt, delay)
            }
            RetryDecision::Stop => println!("attempt {}: give up", attempt),
        }
    }

    // Simulate a transport feeding chunks into the streamed decoder.
    let (decoder, mut result) = QueryDecoder::streamed("demo-req", None, Arc::new(JsonCodec));
    for row in [r#"{"name":"amber","abv":6.0}"#, r#"{"name":"pale","abv":5.2}"#] {
        decoder.push(QueryChunk::Payload {
            section: Section::Rows,
            buffer: ChunkBuffer::new(row.as_bytes()),
        })?;
    }
    decoder.push(QueryChunk::SectionEnd(Section::Rows))?;
    decoder.push(QueryChunk::Status { success: true })?;

    while let Some(row) = result.rows().next().await {
        println!("row:      {}", row?);
    }
    println!("success:  {}", result.final_success().await?);

    Ok(())
}
