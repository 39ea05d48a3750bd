use cucumber::{cli, World};
use cucumber_tests::features::StockroomWorld;

#[tokio::main]
async fn main() {
    StockroomWorld::cucumber()
        .with_cli::<()>(cli::Opts::parsed())
        .run_and_exit("features/")
        .await;
}
