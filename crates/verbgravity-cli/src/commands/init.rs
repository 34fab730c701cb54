//! The `verbgravity init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("verbgravity.toml").exists() {
        println!("verbgravity.toml already exists, skipping.");
    } else {
        std::fs::write("verbgravity.toml", SAMPLE_CONFIG)?;
        println!("Created verbgravity.toml");
    }

    std::fs::create_dir_all("passages")?;
    let example_path = std::path::Path::new("passages/example.json");
    if example_path.exists() {
        println!("passages/example.json already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_PASSAGE)?;
        println!("Created passages/example.json");
    }

    println!("\nNext steps:");
    println!("  1. Set api_base_url in verbgravity.toml to analyse your own passages");
    println!("  2. Run: verbgravity validate --passage passages/example.json");
    println!("  3. Run: verbgravity play --passage passages/example.json");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# verbgravity configuration

# Analysis and session API. Leave unset to play offline from passage files.
# api_base_url = "http://localhost:8000"

# CORE: select the subject's head word. FULL: select the whole subject phrase.
grading_mode = "FULL"

advance_delay_ms = 1000
request_timeout_secs = 30
output_dir = "./verbgravity-results"
"#;

const EXAMPLE_PASSAGE: &str = r#"{
  "sentences": [
    {
      "id": 0,
      "text": "The old dog sleeps.",
      "tokens": [
        {"id": 0, "text": "The", "pos": "DET", "tag": "DT", "dep": "det"},
        {"id": 1, "text": "old", "pos": "ADJ", "tag": "JJ", "dep": "amod"},
        {"id": 2, "text": "dog", "pos": "NOUN", "tag": "NN", "dep": "nsubj"},
        {"id": 3, "text": "sleeps", "pos": "VERB", "tag": "VBZ", "dep": "ROOT"},
        {"id": 4, "text": ".", "pos": "PUNCT", "tag": ".", "dep": "punct"}
      ],
      "key": {"roots": [3], "subjects": [2], "subjectSpans": [[0, 1, 2]]}
    },
    {
      "id": 1,
      "text": "Close the door.",
      "tokens": [
        {"id": 0, "text": "Close", "pos": "VERB", "tag": "VB", "dep": "ROOT"},
        {"id": 1, "text": "the", "pos": "DET", "tag": "DT", "dep": "det"},
        {"id": 2, "text": "door", "pos": "NOUN", "tag": "NN", "dep": "dobj"},
        {"id": 3, "text": ".", "pos": "PUNCT", "tag": ".", "dep": "punct"}
      ],
      "key": {"roots": [0], "subjects": [null], "subjectSpans": []}
    },
    {
      "id": 2,
      "text": "Birds sing and fish swim.",
      "tokens": [
        {"id": 0, "text": "Birds", "pos": "NOUN", "tag": "NNS", "dep": "nsubj"},
        {"id": 1, "text": "sing", "pos": "VERB", "tag": "VBP", "dep": "ROOT"},
        {"id": 2, "text": "and", "pos": "CCONJ", "tag": "CC", "dep": "cc"},
        {"id": 3, "text": "fish", "pos": "NOUN", "tag": "NNS", "dep": "nsubj"},
        {"id": 4, "text": "swim", "pos": "VERB", "tag": "VBP", "dep": "conj"},
        {"id": 5, "text": ".", "pos": "PUNCT", "tag": ".", "dep": "punct"}
      ],
      "key": {"roots": [1, 4], "subjects": [0, 3], "subjectSpans": [[0], [3]]}
    }
  ],
  "meta": {"totalSentences": 3, "model": "en_core_web_sm"}
}
"#;
