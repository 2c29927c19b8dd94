//! An example demonstrating how to check a Git index file using the git-verify crate.
//! Pass the path of an index file as the first argument, e.g. `.git/index`.
//! The index must have been written with `index.recordEndOfIndexEntries` for extensions to show up.
use std::env;

use git_verify::verify_index;

fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    let Some(index_path) = env::args().nth(1) else {
        println!("usage: verify_index <index>");
        return;
    };

    match verify_index(&index_path) {
        Ok(report) => {
            println!("[file] size: {}", report.file_size);
            println!("{}", report.header);
            for ext in &report.extensions {
                println!("{ext}");
            }
            println!("{index_path} ok");
        }
        Err(e) => {
            println!("verify failed: {e}");
            std::process::exit(1);
        }
    }
}
