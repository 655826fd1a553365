//! heapdb demo - drives a heap table through one transaction

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use heapdb::access::{DataType, HeapFile, Tuple, TupleId, Value};
use heapdb::catalog::{Column, ColumnId, Schema, StorageManager};
use heapdb::storage::{StorageConfig, DEFAULT_PAGE_SIZE};
use heapdb::transaction::{IsolationLevel, Operation, TransactionGuard, TransactionManager};
use std::sync::Arc;

/// heapdb - in-memory MVCC heap storage demo
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Page size in bytes
    #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Number of rows to insert
    #[arg(short, long, default_value = "250")]
    rows: i64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = StorageConfig::new(args.page_size).context("Invalid page size")?;
    let mut storage = StorageManager::with_config(config);
    let transactions = Arc::new(TransactionManager::new());

    let schema = Schema::with_columns(vec![
        Column::new(ColumnId(0), "id", DataType::Integer).primary_key(),
        Column::new(ColumnId(1), "name", DataType::Text),
    ])
    .context("Failed to build users schema")?;
    let table_id = storage.create_table("users", schema);
    println!("📊 Created table 'users' ({})", table_id);

    let heap = storage
        .get_table_mut(table_id)
        .context("Table vanished after creation")?;
    let schema = Arc::clone(heap.schema());

    let txn = TransactionGuard::begin(Arc::clone(&transactions), IsolationLevel::default());
    let mut inserted = Vec::new();
    for id in 0..args.rows {
        let tuple = Tuple::new(
            Arc::clone(&schema),
            vec![Value::Integer(id), Value::Text(format!("user{}", id))],
            txn.id(),
        )?;
        let tuple_id = heap
            .insert_tuple(&tuple, txn.id())
            .with_context(|| format!("Failed to insert row {}", id))?;
        txn.record(Operation::Insert { table_id, tuple_id })?;
        inserted.push(tuple_id);
    }
    println!("➕ Inserted {} rows with {}", inserted.len(), txn.id());

    // Widen every tenth row and delete every seventh
    for (i, &old) in inserted.iter().enumerate() {
        if i % 7 == 0 {
            heap.delete_tuple(old, txn.id())?;
            txn.record(Operation::Delete {
                table_id,
                tuple_id: old,
            })?;
        } else if i % 10 == 0 {
            let tuple = Tuple::new(
                Arc::clone(&schema),
                vec![
                    Value::Integer(i as i64),
                    Value::Text(format!("renamed user number {}", i)),
                ],
                txn.id(),
            )?;
            let new = heap.update_tuple(old, &tuple, txn.id())?;
            txn.record(Operation::Update { table_id, old, new })?;
        }
    }

    let txn_id = txn.id();
    txn.commit()?;
    let summary = transactions
        .get_transaction(txn_id)
        .context("Committed transaction missing")?;
    println!(
        "✅ {} {} after {} operations in {:?}",
        txn_id,
        summary.state(),
        summary.operations().len(),
        summary.duration()
    );

    print_layout(heap, &inserted);
    Ok(())
}

fn print_layout(heap: &HeapFile, inserted: &[TupleId]) {
    println!();
    println!("Table '{}': {} pages", heap.name(), heap.page_count());
    for page in heap.pages() {
        println!(
            "   - page {}: {} slots, {} live, {} bytes free",
            page.page_id(),
            page.slot_count(),
            page.live_tuple_count(),
            page.free_space()
        );
    }

    let relocated = inserted
        .iter()
        .filter(|&&tuple_id| heap.version_chain(tuple_id).len() > 1)
        .count();
    println!("   - {} live rows, {} relocated versions", heap.tuples().count(), relocated);
}
