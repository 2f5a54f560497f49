// Archive host
pub const DEFAULT_HOST: &str = "https://dumps.wikimedia.org";

// Output layout
pub const DEFAULT_OUTPUT_BASE: &str = "dumps";
pub const LATEST: &str = "latest";

// Workspace artifacts
pub const WORKSPACE_PREFIX: &str = "dump-fetch-";
pub const FILTERED_MANIFEST_FILE: &str = "filtered-manifest.txt";
pub const URL_LIST_FILE: &str = "urls.txt";

// External downloader
pub const ARIA2C_BINARY: &str = "aria2c";

// Checksum algorithm aliases
pub const MD5_ALIASES: &[&str] = &["md5", "alg1"];
pub const SHA1_ALIASES: &[&str] = &["sha1", "alg2"];
