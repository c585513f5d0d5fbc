//! Benchmarks for the detector walk.
//!
//! Run with: `cargo bench -p the-fluid --bench detector`

use divan::{
  Bencher,
  black_box,
};
use the_doc::{
  document::{
    Document,
    NodeSpec,
  },
  transaction::Transaction,
};
use the_fluid::{
  Detector,
  InsertionMode,
  Options,
};

fn main() {
  divan::main();
}

fn make_doc(paragraphs: usize) -> Document {
  let line = "The quick brown fox jumps over the lazy dog.";
  Document::from_specs((0..paragraphs).map(|_| NodeSpec::paragraph(line)))
}

/// The document after typing one character at the end of its last node.
fn type_last(doc: &Document) -> Document {
  let mut tx = Transaction::new(doc);
  let last = doc.text_nodes().last().map(|node| (node.id, node.text.chars().count()));
  if let Some((id, len)) = last {
    tx.insert_text(id, len, "x").unwrap();
  }
  tx.doc().clone()
}

fn primed(options: Options, doc: &Document) -> Detector {
  let mut detector = Detector::new(options);
  detector.prime(doc);
  detector
}

#[divan::bench(args = [16, 256, 4096])]
fn keystroke(bencher: Bencher, paragraphs: usize) {
  let before = make_doc(paragraphs);
  let after = type_last(&before);

  bencher
    .with_inputs(|| primed(Options::default(), &before))
    .bench_local_values(|mut detector| {
      black_box(detector.on_document_changed(black_box(&before), black_box(&after)));
    });
}

#[divan::bench(args = [16, 256, 4096])]
fn keystroke_per_character(bencher: Bencher, paragraphs: usize) {
  let before = make_doc(paragraphs);
  let after = type_last(&before);
  let options = Options::default().with_insertion(InsertionMode::PerCharacter);

  bencher
    .with_inputs(|| primed(options, &before))
    .bench_local_values(|mut detector| {
      black_box(detector.on_document_changed(black_box(&before), black_box(&after)));
    });
}

#[divan::bench(args = [16, 256, 4096])]
fn unchanged(bencher: Bencher, paragraphs: usize) {
  let doc = make_doc(paragraphs);
  let copy = doc.clone();
  let mut detector = primed(Options::default(), &doc);

  bencher.bench_local(|| {
    black_box(detector.on_document_changed(black_box(&doc), black_box(&copy)));
  });
}
