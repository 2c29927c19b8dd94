//! An example demonstrating how to verify a Git pack file using the git-verify crate.
//! This example reads a pack file from disk, walks every object, and prints out the
//! decoded object headers.
//! Pass the path of a pack file as the first argument, e.g. `.git/objects/pack/pack-*.pack`.
use std::env;

use git_verify::verify_pack;

fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    let Some(pack_path) = env::args().nth(1) else {
        println!("usage: verify_pack <file.pack>");
        return;
    };

    match verify_pack(&pack_path) {
        Ok(report) => {
            println!("{}", report.header);
            for object in &report.objects {
                println!("{object}");
            }
            if let Some(trailer) = report.trailer {
                println!("trailer: {trailer}");
            }
            println!("{pack_path} ok");
        }
        Err(e) => {
            println!("verify failed: {e}");
            std::process::exit(1);
        }
    }
}
