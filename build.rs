use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-env-changed=EPICS_BASE");
    println!("cargo:rerun-if-env-changed=EPICS_HOST_ARCH");

    if env::var_os("CARGO_FEATURE_EPICS").is_none() {
        return;
    }

    // iocshRegister, epicsStdoutPrintf and errlogPrintf all live in libCom.
    let Some(base) = env::var_os("EPICS_BASE") else {
        println!("cargo:warning=EPICS_BASE is not set; relying on the default linker search path for libCom");
        println!("cargo:rustc-link-lib=dylib=Com");
        return;
    };
    let host_arch = env::var("EPICS_HOST_ARCH").unwrap_or_else(|_| default_host_arch());
    let lib_dir = PathBuf::from(base).join("lib").join(host_arch);

    println!("cargo:rustc-link-search=native={}", lib_dir.display());
    println!("cargo:rustc-link-lib=dylib=Com");
}

fn default_host_arch() -> String {
    let os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
    match (os.as_str(), arch.as_str()) {
        ("linux", "x86_64") => "linux-x86_64".to_owned(),
        ("linux", "aarch64") => "linux-aarch64".to_owned(),
        ("macos", "aarch64") => "darwin-aarch64".to_owned(),
        ("macos", _) => "darwin-x86".to_owned(),
        ("windows", _) => "windows-x64".to_owned(),
        (os, arch) => format!("{os}-{arch}"),
    }
}
