fn main() {
    // Plugin declarations embed the compiler version so the loader can refuse
    // modules built by a different rustc (trait object layout is not stable
    // across compiler versions).
    let version = rustc_version::version().expect("failed to query rustc version");
    println!("cargo:rustc-env=RUSTC_VERSION={version}");
}
