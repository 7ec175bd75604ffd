use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::MakeWriter;

use vue_host::{MemoryFs, ParseJs, ProjectConfig, ServiceHost, TextDocument, VirtualHost};

#[derive(Clone, Default)]
struct SharedWriter {
  buffer: Arc<Mutex<Vec<u8>>>,
}

impl SharedWriter {
  fn contents(&self) -> String {
    String::from_utf8(self.buffer.lock().unwrap().clone()).unwrap()
  }
}

struct SharedWriterGuard<'a> {
  buffer: &'a Arc<Mutex<Vec<u8>>>,
}

impl io::Write for SharedWriterGuard<'_> {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.buffer.lock().unwrap().extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

impl<'a> MakeWriter<'a> for SharedWriter {
  type Writer = SharedWriterGuard<'a>;

  fn make_writer(&'a self) -> Self::Writer {
    SharedWriterGuard {
      buffer: &self.buffer,
    }
  }
}

#[test]
fn program_span_and_rewrite_events_are_emitted() {
  let writer = SharedWriter::default();
  let subscriber = tracing_subscriber::fmt()
    .with_span_events(FmtSpan::CLOSE)
    .with_max_level(tracing::Level::DEBUG)
    .with_ansi(false)
    .with_writer(writer.clone())
    .finish();
  let _guard = tracing::subscriber::set_default(subscriber);

  let fs = MemoryFs::new();
  let mut host = ServiceHost::new(
    VirtualHost::new(ProjectConfig::new("/proj", Vec::new()), fs),
    ParseJs,
  );
  host.update_current_document(&TextDocument::new(
    "/proj/App.vue",
    1,
    "<script>\nexport default { name: 'App' }\n</script>\n",
  ));
  let program = host.program();
  assert!(program.missing.is_empty());

  drop(_guard);
  let output = writer.contents();
  assert!(
    output.contains("component rewrite applied"),
    "expected rewrite event, got: {output}"
  );
  assert!(
    output.contains("program") && output.contains("close"),
    "expected program span close, got: {output}"
  );
}
