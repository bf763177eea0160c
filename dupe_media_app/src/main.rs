fn main() {
    let return_code = dupe_media_app::run_app();
    std::process::exit(return_code)
}
