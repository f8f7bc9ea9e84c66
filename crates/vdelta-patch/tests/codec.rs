use serde_json::json;

use vdelta_patch::{decode, encode, ApplyError, LiveTree, PatchError, PatchReader, Recorder};
use vdelta_types::{Address, ChangeLog, DecoderSpec, Element, Instruction, Node};

const SVG: &str = "http://www.w3.org/2000/svg";
const XLINK: &str = "http://www.w3.org/1999/xlink";

fn every_instruction() -> Vec<Instruction> {
    let decoder = DecoderSpec::Record {
        fields: vec![
            ("key".into(), DecoderSpec::field("key", DecoderSpec::String)),
            ("alt".into(), DecoderSpec::optional("altKey", DecoderSpec::Bool)),
        ],
    };
    vec![
        Instruction::SelectChildren,
        Instruction::SelectSibling { offset: -7 },
        Instruction::SelectParent,
        Instruction::InsertText { data: "héllo".into() },
        Instruction::InsertComment { data: String::new() },
        Instruction::InsertElement { local_name: "div".into() },
        Instruction::InsertElementNs { namespace: SVG.into(), local_name: "svg".into() },
        Instruction::InsertStashedNode { address: Address::new(3) },
        Instruction::ReplaceWithText { data: "t".into() },
        Instruction::ReplaceWithComment { data: "c".into() },
        Instruction::ReplaceWithElement { local_name: "span".into() },
        Instruction::ReplaceWithElementNs { namespace: SVG.into(), local_name: "g".into() },
        Instruction::ReplaceWithStashedNode { address: Address::new(u32::MAX) },
        Instruction::RemoveNextSibling,
        Instruction::SetAttribute { name: "id".into(), value: "main".into() },
        Instruction::SetAttributeNs { namespace: XLINK.into(), name: "href".into(), value: "#a".into() },
        Instruction::RemoveAttribute { name: "title".into() },
        Instruction::RemoveAttributeNs { namespace: XLINK.into(), name: "title".into() },
        Instruction::AssignProperty { name: "value".into(), value: json!({"nested": [1, 2.5, "x", null]}) },
        Instruction::DeleteProperty { name: "checked".into() },
        Instruction::SetStyleRule { name: "color".into(), value: "red".into() },
        Instruction::RemoveStyleRule { name: "margin".into() },
        Instruction::AddEventListener { event_type: "keydown".into(), decoder: decoder.clone(), capture: true },
        Instruction::RemoveEventListener { event_type: "keydown".into(), decoder, capture: false },
        Instruction::SetTextData { data: "new text".into() },
        Instruction::EditTextData { start: 2, end: 5, prefix: "<".into(), suffix: String::new() },
        Instruction::StashNextSibling { address: Address::new(0) },
        Instruction::DiscardStashedNode { address: Address::new(1) },
        Instruction::ShiftSiblings { count: 4 },
    ]
}

#[test]
fn every_instruction_kind_round_trips() {
    let instructions = every_instruction();
    assert_eq!(instructions.len(), 29);
    for instruction in &instructions {
        let log = ChangeLog::from(vec![instruction.clone()]);
        assert_eq!(decode(encode(&log).as_bytes()).unwrap(), log, "{}", instruction.name());
    }
}

#[test]
fn whole_log_round_trips_in_order() {
    let log = ChangeLog::from(every_instruction());
    let patch = encode(&log);
    assert_eq!(patch.records(), log.len());
    assert_eq!(patch.reader().validate().unwrap(), log.len());
    assert_eq!(patch.reader().decode().unwrap(), log);
}

#[test]
fn corrupt_tail_reaches_no_executor_call() {
    let log = ChangeLog::from(vec![
        Instruction::InsertText { data: "first".into() },
        Instruction::InsertText { data: "second".into() },
    ]);
    let mut bytes = encode(&log).as_bytes().to_vec();
    bytes.push(0xF0);

    let mut recorder = Recorder::new();
    let err = PatchReader::new(&bytes).apply(&mut recorder, ()).unwrap_err();
    assert!(matches!(
        err,
        ApplyError::Decode(PatchError::UnknownOpcode { opcode: 0xF0, .. })
    ));
    assert!(recorder.instructions().is_empty());
}

#[test]
fn corrupt_patch_leaves_host_unchanged() {
    let base = Node::fragment(vec![
        Node::from(Element::new("ul").children(vec![Node::text("one")])),
        Node::text("tail"),
    ]);
    let mut host = LiveTree::render(&base);
    let before = host.clone();

    let log = ChangeLog::from(vec![
        Instruction::RemoveNextSibling,
        Instruction::SelectSibling { offset: 1 },
        Instruction::SetTextData { data: "changed".into() },
    ]);
    let patch = encode(&log);
    let cut = &patch.as_bytes()[..patch.len() - 3];

    assert!(matches!(
        host.apply_patch(cut),
        Err(ApplyError::Decode(PatchError::Truncated { .. }))
    ));
    assert_eq!(host, before);
    assert_eq!(host.snapshot(), base.flatten());
}

#[test]
fn host_error_mid_patch_leaves_host_unchanged() {
    let mut host = LiveTree::render(&Node::text("only"));
    let before = host.clone();
    let log = ChangeLog::from(vec![
        Instruction::RemoveNextSibling,
        Instruction::RemoveNextSibling,
    ]);
    assert!(matches!(
        host.apply_patch(encode(&log).as_bytes()),
        Err(ApplyError::Executor(_))
    ));
    assert_eq!(host, before);
}
