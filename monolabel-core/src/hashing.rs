//! Hashing - SHA-256 digests for jobs and rendered labels
//!
//! Identical jobs produce identical images, so the image digest is stable
//! across runs and machines. Manifest hashes cover the canonical JSON form.

use serde::Serialize;
use serde_json::{to_string, Value};
use sha2::{Digest, Sha256};

use crate::job::Job;

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Keys sorted at every depth, no whitespace. Independent of map ordering
/// features enabled elsewhere in the build.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    write_canonical(&serde_json::to_value(value)?, &mut out)?;
    Ok(out)
}

fn write_canonical(value: &Value, out: &mut String) -> Result<(), serde_json::Error> {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by_key(|(key, _)| *key);
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&to_string(key)?);
                out.push(':');
                write_canonical(item, out)?;
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&to_string(scalar)?),
    }
    Ok(())
}

pub fn compute_manifest_hash<T: Serialize>(manifest: &T) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(manifest)?;
    Ok(sha256_hex(canonical.as_bytes()))
}

/// job_hash = sha256(symbology + canonical_job + engine_version)
pub fn compute_job_hash(job: &Job, engine_version: &str) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(job)?;
    let combined = format!("{}:{}:{}", job.symbology, canonical, engine_version);
    Ok(sha256_hex(combined.as_bytes()))
}
