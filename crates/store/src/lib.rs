//! Hosted analytics store client — the concrete telemetry sink.
//!
//! Records are queued on a bounded channel and flushed in per-table batches
//! to the store's REST insert endpoints by a background task. Delivery is
//! best-effort: a full queue drops the record, a failed flush is logged and
//! forgotten. The subsystem never reads, updates, or deletes.

pub mod writer;

pub use writer::StoreWriter;
