// Targets whose `struct dirent` is known to carry `d_type`, used when no C compiler is usable.
const KNOWN_D_TYPE_TARGETS: [&str; 9] = [
    "linux",
    "android",
    "macos",
    "ios",
    "freebsd",
    "dragonfly",
    "openbsd",
    "netbsd",
    "emscripten",
];

#[allow(clippy::unwrap_used)]
fn check_dirent_has_field(cfg_name: &str) -> bool {
    let out = std::env::var("OUT_DIR").unwrap();

    let c_file = format!("check_{cfg_name}");

    let src = std::path::PathBuf::from(&out).join(format!("{c_file}.c"));

    // This C source fails to compile if the struct field is not present.
    // We derive the field name from the `cfg_name`, which is of the form `has_<field>`.
    let field_name = cfg_name.strip_prefix("has_").unwrap_or(cfg_name).to_owned();
    assert!(
        field_name.starts_with("d_"),
        "Field name must start with d_"
    );

    let code = format!(
        // use stddef.h to get offsetof
        "#include <dirent.h>\n#include <stddef.h>\nstatic const size_t off = offsetof(struct dirent, {field_name});\nint main(void) {{ (void)off; return 0; }}\n",
    );
    if std::fs::write(&src, code).is_err() {
        return false;
    }

    let mut build = cc::Build::new();
    // Probe only, the object must never end up on the link line
    build
        .file(&src)
        .cargo_metadata(false)
        .cargo_warnings(false)
        .cargo_output(true);

    build.try_compile(&c_file).is_ok()
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    // Tell cargo about the cfg we intend to use so `check-cfg` won't warn.
    println!("cargo:rustc-check-cfg=cfg(has_d_type)");

    let family = std::env::var("CARGO_CFG_TARGET_FAMILY").unwrap_or_default();
    if !family.split(',').any(|f| f == "unix") {
        // FindFirstFileExW reports attributes instead, nothing to probe
        return;
    }

    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();

    if check_dirent_has_field("has_d_type") || KNOWN_D_TYPE_TARGETS.contains(&target_os.as_str()) {
        println!("cargo:rustc-cfg=has_d_type");
    } else {
        println!(
            "cargo:warning=struct dirent has no d_type on {target_os}, every entry will be reported as Unknown"
        );
    }
}
