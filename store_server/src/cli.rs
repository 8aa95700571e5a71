use std::{env, env::VarError};

/// The server takes no arguments. Passing any prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Secrets are deliberately absent from this list
    const DISPLAY_ENVS: [&str; 17] = [
        "RUST_LOG",
        "STORE_HOST",
        "STORE_PORT",
        "STORE_DATABASE_URL",
        "STORE_USE_X_FORWARDED_FOR",
        "STORE_USE_FORWARDED",
        "STORE_PENDING_ORDER_TIMEOUT",
        "STORE_EXPIRY_CHECK_INTERVAL",
        "STORE_LOW_STOCK_THRESHOLD",
        "STORE_MERCHANT_VPA",
        "STORE_MERCHANT_NAME",
        "CASHFREE_BASE_URL",
        "CASHFREE_APP_ID",
        "CASHFREE_API_VERSION",
        "CASHFREE_RETURN_URL",
        "CASHFREE_NOTIFY_URL",
        "CASHFREE_TIMEOUT",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
