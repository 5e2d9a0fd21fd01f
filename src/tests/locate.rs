use crate::{
    locate, locate_near, Block, BlockAttrs, Document, LocateError, LocateOptions, Scope, Step,
    TextMatch, Transaction, Word,
};

/// Blocks of `(speaker name, speaker id, space-separated words)`.
fn doc(blocks: &[(&str, &str, &str)]) -> Document {
    let mut next_id = 0;
    let mut built = Vec::new();
    for (name, speaker_id, text) in blocks {
        let mut words = Vec::new();
        for word in text.split_whitespace() {
            next_id += 1;
            words.push(Word::new(format!("w{}", next_id), next_id as f64 * 0.5, word));
        }
        built.push(Block::with_words(BlockAttrs::new(*name, *speaker_id), words));
    }
    Document::new(built).unwrap()
}

fn ranges(matches: &[TextMatch]) -> Vec<(usize, usize, &str)> {
    matches
        .iter()
        .map(|m| (m.from, m.to, m.text.as_str()))
        .collect()
}

#[test]
fn substring_and_whole_word() {
    let doc = doc(&[("Mari", "spk-1", "kaks kala")]);
    let found = locate(&doc, "ka", &LocateOptions::default()).unwrap();
    assert_eq!(ranges(&found), vec![(2, 4, "ka"), (9, 11, "ka")]);

    let whole = locate(&doc, "ka", &LocateOptions::default().whole_word()).unwrap();
    assert!(whole.is_empty());
}

#[test]
fn match_spans_words_in_one_block() {
    let doc = doc(&[("Mari", "spk-1", "kaks kala")]);
    let found = locate(&doc, "s k", &LocateOptions::default()).unwrap();
    assert_eq!(ranges(&found), vec![(5, 10, "s k")]);
    assert_eq!(doc.text_between(5, 10, ""), "s k");
}

#[test]
fn matches_never_cross_blocks() {
    let doc = doc(&[("Mari", "spk-1", "kaks"), ("Jaan", "spk-2", "kala")]);
    assert!(locate(&doc, "kakskala", &LocateOptions::default()).unwrap().is_empty());
    assert!(locate(&doc, "ks ka", &LocateOptions::default()).unwrap().is_empty());

    // block edges are word boundaries
    let found = locate(&doc, "kala", &LocateOptions::default().whole_word()).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].from, doc.block_start(1).unwrap() + 2);
}

#[test]
fn case_folding() {
    let doc = doc(&[("Mari", "spk-1", "Õhtul KALA")]);
    let found = locate(&doc, "õhtul kala", &LocateOptions::default()).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].text, "Õhtul KALA");
    assert!(locate(&doc, "kala", &LocateOptions::default().case_sensitive())
        .unwrap()
        .is_empty());
}

#[test]
fn matches_do_not_overlap() {
    let doc = doc(&[("Mari", "spk-1", "aaaa")]);
    let found = locate(&doc, "aa", &LocateOptions::default()).unwrap();
    assert_eq!(ranges(&found), vec![(2, 4, "aa"), (4, 6, "aa")]);
}

#[test]
fn whole_word_rejection_keeps_scanning() {
    let doc = doc(&[("Mari", "spk-1", "kalakala kala")]);
    let found = locate(&doc, "kala", &LocateOptions::default().whole_word()).unwrap();
    assert_eq!(ranges(&found), vec![(13, 17, "kala")]);
}

#[test]
fn scopes() {
    let doc = doc(&[
        ("Mari", "spk-1", "kala ja kala"),
        ("Jaan", "spk-2", "kala"),
    ]);
    let all = locate(&doc, "kala", &LocateOptions::default()).unwrap();
    assert_eq!(all.len(), 3);

    let block = locate(&doc, "kala", &LocateOptions::default().with_scope(Scope::Block(1))).unwrap();
    assert_eq!(block, vec![all[2].clone()]);

    let speaker = locate(
        &doc,
        "kala",
        &LocateOptions::default().with_scope(Scope::Speaker("spk-1".into())),
    )
    .unwrap();
    assert_eq!(speaker.len(), 2);
    let by_name = locate(
        &doc,
        "kala",
        &LocateOptions::default().with_scope(Scope::Speaker("Jaan".into())),
    )
    .unwrap();
    assert_eq!(by_name.len(), 1);

    let range = locate(
        &doc,
        "kala",
        &LocateOptions::default().with_scope(Scope::Range {
            from: all[0].from + 1,
            to: all[1].to,
        }),
    )
    .unwrap();
    assert_eq!(range, vec![all[1].clone()]);

    let unknown = locate(
        &doc,
        "kala",
        &LocateOptions::default().with_scope(Scope::Speaker("nobody".into())),
    )
    .unwrap();
    assert!(unknown.is_empty());
}

#[test]
fn invalid_scopes() {
    let doc = doc(&[("Mari", "spk-1", "kala")]);
    let size = doc.size();
    assert_eq!(
        locate(
            &doc,
            "kala",
            &LocateOptions::default().with_scope(Scope::Range { from: 4, to: 2 })
        ),
        Err(LocateError::InvalidRange { from: 4, to: 2, size })
    );
    assert_eq!(
        locate(
            &doc,
            "kala",
            &LocateOptions::default().with_scope(Scope::Range { from: 0, to: size + 1 })
        ),
        Err(LocateError::InvalidRange {
            from: 0,
            to: size + 1,
            size
        })
    );
    assert_eq!(
        locate(&doc, "kala", &LocateOptions::default().with_scope(Scope::Block(3))),
        Err(LocateError::UnknownBlock { index: 3, count: 1 })
    );
}

#[test]
fn empty_search_and_empty_document() {
    let doc = doc(&[("Mari", "spk-1", "kala")]);
    assert!(locate(&doc, "", &LocateOptions::default()).unwrap().is_empty());
    let empty = Document::new(vec![]).unwrap();
    assert!(locate(&empty, "kala", &LocateOptions::default()).unwrap().is_empty());
}

#[test]
fn no_match_inside_grapheme_cluster() {
    let doc = doc(&[("Mari", "spk-1", "se\u{301}e")]);
    let found = locate(&doc, "e", &LocateOptions::default()).unwrap();
    assert_eq!(ranges(&found), vec![(5, 6, "e")]);
}

#[test]
fn nearest_match() {
    let doc = doc(&[("Mari", "spk-1", "kala kala kala")]);
    let near = locate_near(&doc, "kala", 14, 3, &LocateOptions::default()).unwrap();
    assert_eq!(near.map(|m| (m.from, m.to)), Some((9, 13)));
    assert_eq!(
        locate_near(&doc, "kala", 14, 0, &LocateOptions::default()).unwrap(),
        None
    );
}

#[test]
fn matches_go_stale_after_commit() {
    let doc = doc(&[("Mari", "spk-1", "kala")]);
    let found = locate(&doc, "kala", &LocateOptions::default()).unwrap();
    assert!(found[0].is_current(&doc));
    assert_eq!(found[0].version, 0);

    let mut tr = Transaction::new(&doc);
    tr.step(Step::SetBlockAttrs {
        pos: 0,
        attrs: BlockAttrs::new("Jaan", "spk-2"),
    })
    .unwrap();
    let next = tr.apply(&doc).unwrap();
    assert!(!found[0].is_current(&next));
}
