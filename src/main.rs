fn main() {
    if let Err(err) = graphvault::cli::run() {
        println!("{}", serde_json::json!({ "error": format!("{:#}", err) }));
        std::process::exit(1);
    }
}
