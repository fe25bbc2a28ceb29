use tokio::io::AsyncRead;
// Import streampart types.
use streampart::MultipartParser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate an `AsyncRead` and the boundary from somewhere e.g. server request body.
    let (reader, boundary) = get_async_reader_from_somewhere().await;

    // Create a `MultipartParser` for that boundary and drive it with the reader.
    // The handler runs once per part, as soon as the part's headers are in.
    MultipartParser::new(boundary)
        .parse_reader(reader, |mut part| async move {
            // Get the field name and the filename if provided in the
            // "Content-Disposition" header.
            let name = part.name().map(ToOwned::to_owned);
            let file_name = part.file_name().map(ToOwned::to_owned);

            println!("Name: {:?}, File Name: {:?}", name, file_name);

            // Read the part content as text.
            let content = part.text().await?;
            println!("Content: {:?}", content);

            Ok(())
        })
        .await?;

    Ok(())
}

// Generate an `AsyncRead` and the boundary from somewhere e.g. server request body.
async fn get_async_reader_from_somewhere() -> (impl AsyncRead, &'static str) {
    let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"My Field\"\r\n\r\nabcd\r\n--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"File Field\"; filename=\"a-text-file.txt\"\r\nContent-Type: text/plain\r\n\r\nHello world\nHello\r\nWorld\rAgain\r\n--X-BOUNDARY--\r\n";

    (data.as_bytes(), "X-BOUNDARY")
}
