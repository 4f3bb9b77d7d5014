//! Generate password hashes for backends and the superusers password.
use anyhow::Result;

use super::HashArgs;
use crate::EXIT_ALLOWED;

pub fn run(args: &HashArgs) -> Result<i32> {
    let hash = authplug_hash::hash_password(&args.password, args.digest, args.iterations)?;
    println!("{}", hash);
    Ok(EXIT_ALLOWED)
}
