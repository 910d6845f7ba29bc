use registry_mirror::cli::{Args, Runner};
use registry_mirror::error::MirrorError;
use registry_mirror::logging::Logger;

#[tokio::main]
async fn main() {
    let args = Args::parse_args();
    let runner = Runner::new(args);

    let exit_code = match runner.run().await {
        Ok(code) => code,
        Err(err) => {
            let logger = Logger::new(false);
            logger.error(&err.to_string());
            // Fatal startup/discovery errors get a code distinct from
            // per-image failures
            match err {
                MirrorError::Config(_) | MirrorError::Discovery(_) => 2,
                _ => 1,
            }
        }
    };

    std::process::exit(exit_code);
}
