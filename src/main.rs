fn main() {
    if let Err(err) = wgpu_shadow_scene::run() {
        eprintln!("Application error: {err}");
        std::process::exit(1);
    }
}
