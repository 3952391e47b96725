//! `sdcm`: manage hardware-certification products, submissions, shipping labels, and packages.

#[tokio::main]
async fn main() {
	std::process::exit(devcenter_manager::cli::run().await.code());
}
