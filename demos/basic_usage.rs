//! Basic usage of a pathspace namespace.
//!
//! Builds a small tree, moves things around, shares the namespace across
//! threads and shows the error variants callers match on.
//!
//! Run with: `cargo run --example basic_usage`

use pathspace::*;
use std::sync::Arc;
use std::thread;

// =============================================================================
// Step 1: Helpers that only need the public API
// =============================================================================

/// Print the subtree below `path`, one line per node.
fn print_tree(ns: &Namespace, path: &str) -> Result<(), NsError> {
    for entry in ns.descendants(path)? {
        let depth = entry.matches('/').count();
        let meta = ns.stat(&entry)?;
        let marker = if meta.is_dir() { "/" } else { "" };
        println!(
            "   {:indent$}{}{marker} ({} bytes)",
            "",
            meta.name,
            meta.size,
            indent = depth * 2
        );
    }
    Ok(())
}

// =============================================================================
// Step 2: Use the namespace
// =============================================================================

fn main() -> Result<(), NsError> {
    println!("=== pathspace Basic Usage Example ===\n");

    let ns = Arc::new(Namespace::new());

    // 1. Containers and leaves
    println!("1. Creating entries...");
    ns.create_directory("/project/src", true)?;
    ns.create_file("/project/src/main.rs")?;
    ns.write("/project/src/main.rs", b"fn main() {}", WriteMode::Overwrite)?;
    ns.put("/project/README", b"pathspace demo\n")?;
    println!("   Created /project/src/main.rs and /project/README");

    // 2. Reading
    println!("\n2. Reading...");
    let text = ns.read_to_string("/project/README")?;
    println!("   /project/README contains: {}", text.trim_end());

    // 3. Append
    println!("\n3. Appending...");
    ns.write("/project/README", b"second line\n", WriteMode::Append)?;
    println!("   /project/README is now {} bytes", ns.file_size("/project/README")?);

    // 4. Relative paths
    println!("\n4. Working directory...");
    ns.set_current_dir("/project")?;
    ns.copy("src/main.rs", "src/lib.rs")?;
    println!("   cwd = {}, copied src/main.rs to src/lib.rs", ns.current_dir());

    // 5. Atomic move
    println!("\n5. Moving...");
    ns.rename("/project/src", "/project/code")?;
    let seen = ns.probe(&["/project/src", "/project/code"])?;
    println!("   /project/src exists: {}, /project/code exists: {}", seen[0], seen[1]);

    // 6. Sharing across threads
    println!("\n6. Concurrent appends...");
    ns.create_file("/project/log")?;
    let workers: Vec<_> = (0..4)
        .map(|i| {
            let ns = Arc::clone(&ns);
            thread::spawn(move || {
                for _ in 0..10 {
                    let line = format!("worker {i}\n");
                    ns.write("/project/log", line.as_bytes(), WriteMode::Append)?;
                }
                Ok::<(), NsError>(())
            })
        })
        .collect();
    for w in workers {
        if let Ok(result) = w.join() {
            result?;
        }
    }
    println!("   /project/log holds {} bytes", ns.file_size("/project/log")?);

    // 7. Tree
    println!("\n7. Tree of /project:");
    print_tree(&ns, "/project")?;
    println!("   Total size: {} bytes", ns.get_size("/project")?);

    // 8. Errors
    println!("\n8. Error handling...");
    match ns.read("/project/missing") {
        Err(NsError::NotFound { path }) => println!("   NotFound for: {path}"),
        other => println!("   Unexpected: {other:?}"),
    }
    match ns.delete("/project", false) {
        Err(NsError::NotEmpty { path }) => println!("   NotEmpty for: {path}"),
        other => println!("   Unexpected: {other:?}"),
    }
    match ns.rename("/project", "/project/code/inner") {
        Err(e @ NsError::InvalidOperation { .. }) => println!("   {e}"),
        other => println!("   Unexpected: {other:?}"),
    }

    // 9. Cleanup
    println!("\n9. Recursive delete...");
    ns.set_current_dir("/")?;
    let removed = ns.delete("/project", true)?;
    println!("   removed: {removed}, lock entries left: {}", ns.lock_table().len());

    println!("\n=== Example complete! ===");
    Ok(())
}
