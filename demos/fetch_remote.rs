use certchain::{
    display_certificate_chain, CertificateChain, LookupOptions, OutputFormat, TrustConfig,
    WebPkiTrustEvaluator,
};
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let target = if args.len() > 1 {
        args[1].clone()
    } else {
        "https://google.com".to_string()
    };

    println!("Fetching certificate chain from {}...\n", target);

    let evaluator = WebPkiTrustEvaluator::new(&TrustConfig::default())?;
    let options = LookupOptions::new(Arc::new(evaluator));

    let chain = CertificateChain::fetch(&target, &options).await?;

    let output = display_certificate_chain(&chain, OutputFormat::Pretty)?;
    println!("{}", output);

    println!("\nCertificate chain fetched successfully!");
    println!("Trust status: {}", chain.trusted());
    println!("Negotiated: {} / {}", chain.protocol_string(), chain.cipher_string());

    for (idx, cert) in chain.certificates().iter().enumerate() {
        println!("\nCertificate {} ({}):", idx, chain.role_of(idx).label());
        println!("  Subject: {}", cert.subject);
        println!("  Valid: {}", cert.is_valid);
        println!("  Status: {}", cert.validity_status);
    }

    Ok(())
}
