use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
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
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 15] = [
        "RUST_LOG",
        "SHOP_HOST",
        "SHOP_PORT",
        "SHOP_DATABASE_URL",
        "SHOP_PUBLIC_URL",
        "SHOP_HIGH_TICKET_THRESHOLD",
        "SHOP_FREQUENT_ORDER_COUNT",
        "SHOP_VERIFY_WEBHOOK_SIGNATURES",
        "SHOP_FLOW_API_URL",
        "SHOP_FLOW_API_KEY",
        "SHOP_FLOW_TIMEOUT_SECS",
        "SHOP_EMAIL_FROM",
        "SHOP_TRANSFER_DETAILS",
        "SHOP_TWILIO_ACCOUNT_SID",
        "SHOP_TWILIO_WHATSAPP_FROM",
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
