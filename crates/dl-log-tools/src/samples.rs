//! A populated `MockWebDav` shaped like a real instance's log directory.

use chrono::{DateTime, TimeZone, Utc};

use dl_webdav::MockWebDav;

/// Date token the sample's current-day files carry.
pub const SAMPLE_DATE: &str = "20240115";

/// Date token of the previous day's files.
pub const SAMPLE_PREVIOUS_DATE: &str = "20240114";

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, minute, 0)
        .single()
        .unwrap_or_default()
}

const ERROR_LOG: &str = "\
[2024-01-15 09:12:03.114 GMT] ERROR PipelineCallServlet|181|Sites-RefArch-Site|Product-Show|PipelineCall|abc123 custom.ProductController [] Error: Product not found
[2024-01-15 09:40:51.002 GMT] ERROR PipelineCallServlet|185|Sites-RefArch-Site|Cart-AddProduct|PipelineCall|def456 system.core [] java.net.SocketTimeoutException: Read timed out
\tat java.net.SocketInputStream.socketRead0(Native Method)
\tat java.net.SocketInputStream.read(SocketInputStream.java:150)
[2024-01-15 14:02:17.530 GMT] ERROR PipelineCallServlet|190|Sites-RefArch-Site|Product-Show|PipelineCall|ghi789 custom.ProductController [] Error: Product not found
[2024-01-15 14:30:00.000 GMT] ERROR JobThread|2203|ImportCatalog system.job [] Failed to import catalog master-catalog
";

const CUSTOM_ERROR_LOG: &str = "\
[2024-01-15 14:11:45.874 GMT] ERROR PipelineCallServlet|201|Sites-RefArch-Site|CheckoutServices-PlaceOrder|PipelineCall|jkl012 custom.CheckoutServices [] Cannot create order for basket 9f2c
";

const WARN_LOG: &str = "\
[2024-01-15 08:00:00.000 GMT] WARN JobThread|2203|ImportCatalog system.core [] - Slow query detected (1845 ms)
[2024-01-15 14:05:10.000 GMT] WARN PipelineCallServlet|190|Sites-RefArch-Site system.core [] - Session size exceeds 10 KB
";

const INFO_LOG: &str = "\
[2024-01-15 00:00:01.000 GMT] INFO Main system.core [] - Instance started
[2024-01-15 08:00:00.000 GMT] INFO JobThread|2203|ImportCatalog system.job [] - Job ImportCatalog started
[2024-01-15 08:15:32.000 GMT] INFO JobThread|2203|ImportCatalog system.job [] - Job ImportCatalog finished
";

const PREVIOUS_ERROR_LOG: &str = "\
[2024-01-14 22:10:00.000 GMT] ERROR PipelineCallServlet|99|Sites-RefArch-Site|Product-Show|PipelineCall|zzz999 custom.ProductController [] Error: Product not found
";

const JOB_LOG: &str = "\
[2024-01-15 08:00:00.000 GMT] INFO JobThread|2203|ImportCatalog system.job [] - Step 1/3 started
[2024-01-15 08:15:32.000 GMT] INFO JobThread|2203|ImportCatalog system.job [] - Step 3/3 finished
";

/// Root logs for two days plus three jobs, one of them with a URL-encoded name.
pub fn sample_store() -> MockWebDav {
    let mut m = MockWebDav::new();

    m.add_file_at(
        &format!("error-blade1-{SAMPLE_DATE}-000000.log"),
        ERROR_LOG,
        at(15, 14, 30),
    );
    m.add_file_at(
        &format!("customerror-blade1-{SAMPLE_DATE}-000000.log"),
        CUSTOM_ERROR_LOG,
        at(15, 14, 11),
    );
    m.add_file_at(
        &format!("warn-blade1-{SAMPLE_DATE}-000000.log"),
        WARN_LOG,
        at(15, 14, 5),
    );
    m.add_file_at(
        &format!("info-blade1-{SAMPLE_DATE}-000000.log"),
        INFO_LOG,
        at(15, 8, 15),
    );
    m.add_file_at(
        &format!("error-blade1-{SAMPLE_PREVIOUS_DATE}-000000.log"),
        PREVIOUS_ERROR_LOG,
        at(14, 22, 10),
    );
    // Not a log file; discovery must ignore it.
    m.add_file_at(
        &format!("quota-blade1-{SAMPLE_DATE}.csv"),
        "metric,value\n",
        at(15, 9, 0),
    );

    m.add_file_at(
        "jobs/ImportCatalog/Job-ImportCatalog-0001.log",
        JOB_LOG,
        at(14, 8, 15),
    );
    m.add_file_at(
        "jobs/ImportCatalog/Job-ImportCatalog-0002.log",
        JOB_LOG,
        at(15, 8, 15),
    );
    m.add_file_at(
        "jobs/Export Feed/Job-Export Feed-0007.log",
        "[2024-01-15 03:00:00.000 GMT] INFO JobThread|77|Export Feed system.job [] - Feed exported\n",
        at(15, 3, 0),
    );
    m.add_file_at(
        "jobs/ImportCatalog/notes.txt",
        "not a job log",
        at(15, 8, 20),
    );
    m.add_dir("jobs/CleanupBaskets");
    m
}
