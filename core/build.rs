//! Compiles the internal blit shaders to SPIR-V at build time and drops them
//! in `OUT_DIR`, the same place the render/compute test fixtures land their
//! precompiled `.spv` blobs for `include_bytes!` to pick up.
use std::env;
use std::fs;
use std::path::Path;

fn compile(compiler: &shaderc::Compiler, path: &str, kind: shaderc::ShaderKind, out_dir: &Path, out_name: &str) {
    let source = fs::read_to_string(path).unwrap_or_else(|e| panic!("failed to read {path}: {e}"));
    let artifact = compiler
        .compile_into_spirv(&source, kind, path, "main", None)
        .unwrap_or_else(|e| panic!("failed to compile {path}: {e}"));
    fs::write(out_dir.join(out_name), artifact.as_binary_u8()).unwrap_or_else(|e| panic!("failed to write {out_name}: {e}"));
    println!("cargo:rerun-if-changed={path}");
}

fn main() {
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");
    let out_dir = Path::new(&out_dir);
    let compiler = shaderc::Compiler::new().expect("shaderc is unavailable");
    compile(&compiler, "shaders/blit.vert", shaderc::ShaderKind::Vertex, out_dir, "blit.vert.spv");
    compile(&compiler, "shaders/blit.frag", shaderc::ShaderKind::Fragment, out_dir, "blit.frag.spv");
}
