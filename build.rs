use std::env;

fn main() {
    println!("cargo:rerun-if-changed=linker.ld");

    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo");
    let target = env::var("TARGET").expect("TARGET is set by cargo");

    // Host builds (docs, IDE checks) have no use for the kernel layout.
    if target.ends_with("-none") {
        println!(
            "cargo:rustc-link-arg-bin=lantern=-T{}/linker.ld",
            manifest_dir
        );
    }
}
