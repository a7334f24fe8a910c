#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    xiaozhi_app::try_main().await
}
