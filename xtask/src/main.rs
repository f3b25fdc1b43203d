/// The xtask binary delegates entirely to nih_plug_xtask, which provides
/// the `bundle` subcommand. Usage:
///
///   cargo xtask bundle cocoa-delay --release
///
/// This compiles the plugin as a cdylib and packages it into `.vst3` and
/// `.clap` bundles under `target/bundled/`.
fn main() -> nih_plug_xtask::Result<()> {
    nih_plug_xtask::main()
}
