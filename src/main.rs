use mole_game_backend::{appstate, config::Config, webserver};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let config = Config::from_env()?;
    let app_state = appstate::new_real_appstate(&config)?;

    log::info!("Starting the mole game backend");
    webserver::serve(app_state, &config.bind_address).await
}
