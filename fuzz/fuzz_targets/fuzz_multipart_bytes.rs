#![no_main]

use libfuzzer_sys::fuzz_target;
use streampart::MultipartParser;
use tokio::runtime;

fuzz_target!(|data: &[u8]| {
    let data = data.to_vec();

    let rt = runtime::Builder::new_current_thread().build().expect("runtime");
    rt.block_on(async {
        let parser = MultipartParser::new("X-BOUNDARY");

        let _ = parser
            .parse_bytes(data, |mut part| async move {
                let _ = part.bytes().await;
                Ok(())
            })
            .await;
    });
});
