//! # media-dedupe CLI
//!
//! Command-line interface for the media library deduplicator.
//!
//! ## Usage
//! ```bash
//! media-dedupe scan ~/Media/Movies --verbose
//! media-dedupe scan ~/Media/TV --mode episodes --output json
//! media-dedupe inspect "Alien.1979.1080p.BluRay.x264.mkv"
//! ```

mod cli;

use media_dedupe::Result;

fn main() -> Result<()> {
    media_dedupe::init_tracing();
    cli::run()
}
