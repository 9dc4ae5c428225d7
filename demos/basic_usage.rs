use futures_util::StreamExt;
use kv_client_api::commands::list_keys::ListKeys;
use kv_client_api::impls::mem_cluster::MemCluster;
use kv_client_api::Command;
use kv_client_api::Location;

#[tokio::main]
async fn main() {
    // An in-memory cluster core standing in for the real transport layer.
    let mut cluster = MemCluster::new();
    cluster.insert_bucket("default", "users", ["alice", "bob", "carol"]);

    // Build an immutable, reusable command targeting one bucket.
    let cmd = ListKeys::builder(Location::in_default_type("users"))
        .with_timeout(std::time::Duration::from_secs(5))
        .build();

    // Dispatch once and await the command-level future.
    let outcome = cmd.execute_async(&cluster).await;
    let response = outcome.response().unwrap();

    // Iterate the response lazily; each item is a fully-qualified Location.
    for location in response {
        println!(
            "record: {}/{}/{}",
            location.bucket_type(),
            location.bucket(),
            location.key().unwrap()
        );
    }

    // The same batch is also available as a stream.
    let mut stream = response.clone().into_stream();
    while let Some(location) = stream.next().await {
        println!("streamed: {:?}", location);
    }

    // Failures surface through the future, never synchronously.
    let down = MemCluster::unreachable("no reachable nodes");
    let outcome = cmd.execute_async(&down).await;
    println!("dispatch against downed cluster: {:?}", outcome.error().unwrap());
}
