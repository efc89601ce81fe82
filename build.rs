fn main() {
    // GIT_COMMIT_HASH is None when building outside a git checkout.
    built::write_built_file().expect("Failed to acquire build-time information");
}
