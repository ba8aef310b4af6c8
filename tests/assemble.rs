use jasm::driver::{assemble_all, Failure, Job, Settings};
use jasm::jvm::class_file::{
    Attribute, AttributeBody, ClassModel, IndexArray, InnerClass, LineNumber, LocalVariable,
    Method, RecordComponent, VectorAttribute, Version,
};
use jasm::jvm::code::{
    CodeAttribute, CodeBody, ExceptionHandler, Instruction, Opcode, SwitchLayout,
};
use jasm::jvm::constants::{ConstCell, ConstPool, HandleKind, ReferenceRank};
use jasm::jvm::{
    ClassAccessFlags, Diagnostics, Error, IgnoreWarnings, InnerClassAccessFlags,
    MethodAccessFlags, Position, Record, WriteContext,
};
use jasm::util::CountingWriter;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn empty_class(name: &str) -> ClassModel {
    let mut class = ClassModel::new(Version::JAVA8, ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER);
    class.this_class = class.pool.class(name).unwrap();
    class.super_class = Some(class.pool.class("java/lang/Object").unwrap());
    class
}

fn add_method(class: &mut ClassModel, name: &str, code: CodeAttribute) {
    let name = class.pool.utf8(name).unwrap();
    let descriptor = class.pool.utf8("()V").unwrap();
    let code = Attribute::new(&mut class.pool, AttributeBody::Code(Box::new(code))).unwrap();
    class.methods.push(Method {
        access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
        name,
        descriptor,
        attributes: vec![code],
    });
}

/// Lay out a body on its own and return its encoded instructions
fn encode_body(mut body: CodeBody) -> (Vec<u8>, Diagnostics) {
    body.layout("test").unwrap();
    let mut pool = ConstPool::new();
    let mut diagnostics = Diagnostics::new();
    pool.finalize(&mut diagnostics).unwrap();

    let mut bytes: Vec<u8> = vec![];
    let mut ctx = WriteContext::new(&pool, &mut diagnostics);
    body.write_code(&mut ctx, &mut bytes).unwrap();
    (bytes, diagnostics)
}

#[test]
fn empty_class_is_byte_exact() {
    init_logging();
    let mut class = empty_class("A");
    let mut bytes: Vec<u8> = vec![];
    class.assemble(&mut Diagnostics::new(), &mut bytes).unwrap();

    let mut expected = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52, 0, 5];
    expected.extend_from_slice(&[1, 0, 1, b'A', 7, 0, 1, 1, 0, 16]);
    expected.extend_from_slice(b"java/lang/Object");
    expected.extend_from_slice(&[7, 0, 3]);
    expected.extend_from_slice(&[0, 0x21, 0, 2, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(bytes, expected);
}

#[test]
fn assembling_is_deterministic() {
    init_logging();
    let mut class = empty_class("me/alec/Loop");
    let mut body = CodeBody::new();
    let top = body.label("top");
    let field = class.pool.field_ref("me/alec/Loop", "count", "I").unwrap();
    body.place(top).unwrap();
    body.push(Instruction::constant(Opcode::GETSTATIC, field));
    body.push(Instruction::branch(Opcode::IFNE, top));
    body.push(Instruction::simple(Opcode::RETURN));
    add_method(&mut class, "spin", CodeAttribute::new(1, 0, body));

    let mut first: Vec<u8> = vec![];
    let mut second: Vec<u8> = vec![];
    class.assemble(&mut Diagnostics::new(), &mut first).unwrap();
    class.assemble(&mut Diagnostics::new(), &mut second).unwrap();
    assert_eq!(first, second);
}

#[test]
fn attribute_lengths_match_written_bytes() {
    init_logging();
    let mut class = empty_class("me/alec/Outer");
    let inner = class.pool.class("me/alec/Outer$Inner").unwrap();
    let inner_name = class.pool.utf8("Inner").unwrap();
    let local_name = class.pool.utf8("x").unwrap();
    let local_type = class.pool.utf8("I").unwrap();
    let exception = class.pool.class("java/lang/Exception").unwrap();

    let mut body = CodeBody::new();
    let start = body.label("start");
    let end = body.label("end");
    let handler = body.label("handler");
    body.place(start).unwrap();
    body.push(Instruction::simple(Opcode::ICONST_0));
    body.push(Instruction::simple(Opcode::ISTORE_0));
    body.place(end).unwrap();
    body.push(Instruction::simple(Opcode::RETURN));
    body.place(handler).unwrap();
    body.push(Instruction::simple(Opcode::ATHROW));

    let mut code = CodeAttribute::new(1, 1, body);
    code.exception_table.push(ExceptionHandler {
        start,
        end,
        handler,
        catch_type: Some(exception),
    });
    let lines = VectorAttribute::new(vec![LineNumber { start, line_number: 7 }]);
    code.attributes
        .push(Attribute::new(&mut class.pool, AttributeBody::LineNumberTable(lines)).unwrap());
    let locals = VectorAttribute::new(vec![LocalVariable {
        start,
        end,
        name: local_name,
        descriptor: local_type,
        index: 0,
    }]);
    code.attributes
        .push(Attribute::new(&mut class.pool, AttributeBody::LocalVariableTable(locals)).unwrap());
    add_method(&mut class, "run", code);

    let inner_classes = VectorAttribute::new(vec![InnerClass {
        inner_class: inner,
        outer_class: Some(class.this_class),
        inner_name: Some(inner_name),
        access_flags: InnerClassAccessFlags::PUBLIC | InnerClassAccessFlags::STATIC,
    }]);
    class
        .attributes
        .push(Attribute::new(&mut class.pool, AttributeBody::InnerClasses(inner_classes)).unwrap());
    class
        .attributes
        .push(Attribute::new(&mut class.pool, AttributeBody::NestMembers(IndexArray(vec![inner]))).unwrap());

    class.prepare(&mut Diagnostics::new()).unwrap();
    let mut reporter = IgnoreWarnings;
    let mut ctx = WriteContext::new(&class.pool, &mut reporter);
    for attribute in class.methods.iter().flat_map(|m| &m.attributes).chain(&class.attributes) {
        let mut writer = CountingWriter::new(Vec::<u8>::new());
        attribute.write(&mut ctx, &mut writer).unwrap();
        assert_eq!(writer.written(), attribute.length() as u64);
    }
    for method in &class.methods {
        let mut writer = CountingWriter::new(Vec::<u8>::new());
        method.write(&mut ctx, &mut writer).unwrap();
        assert_eq!(writer.written(), method.length() as u64);
    }
}

#[test]
fn ldc_raises_rank_for_good() {
    init_logging();
    let mut class = empty_class("A");
    let constant = class.pool.string("hello").unwrap();
    let mut body = CodeBody::new();
    body.push(Instruction::constant(Opcode::LDC, constant));
    body.push(Instruction::constant(Opcode::LDC_W, constant));
    body.push(Instruction::simple(Opcode::RETURN));
    add_method(&mut class, "run", CodeAttribute::new(2, 0, body));

    class.pool.set_rank(constant, ReferenceRank::None);
    class.assemble(&mut Diagnostics::new(), &mut Vec::<u8>::new()).unwrap();
    assert_eq!(class.pool.rank(constant), ReferenceRank::Ldc);
}

#[test]
fn branch_offsets() {
    let mut body = CodeBody::new();
    let at5 = body.label("at5");
    let at10 = body.label("at10");
    body.push(Instruction::branch(Opcode::GOTO, at10));
    body.push(Instruction::simple(Opcode::NOP));
    body.push(Instruction::simple(Opcode::NOP));
    body.place(at5).unwrap();
    for _ in 5..10 {
        body.push(Instruction::simple(Opcode::NOP));
    }
    body.place(at10).unwrap();
    for _ in 10..20 {
        body.push(Instruction::simple(Opcode::NOP));
    }
    body.push(Instruction::branch(Opcode::GOTO, at5));

    let (bytes, _) = encode_body(body);
    assert_eq!(&bytes[0..3], &[0xA7, 0, 10]);
    assert_eq!(&bytes[20..23], &[0xA7, 0xFF, 0xF1]);
}

#[test]
fn lookupswitch_padding() {
    for (leading, padding) in [(1usize, 2usize), (4, 3)] {
        let mut body = CodeBody::new();
        let case = body.label("case");
        for _ in 0..leading {
            body.push(Instruction::simple(Opcode::NOP));
        }
        body.push(Instruction::switch(SwitchLayout::lookup(vec![3], vec![case], None)));
        body.place(case).unwrap();
        body.push(Instruction::simple(Opcode::RETURN));

        let (bytes, _) = encode_body(body);
        let switch = &bytes[leading..];
        let size = 1 + padding + 8 * 2;
        assert!(switch[1..=padding].iter().all(|b| *b == 0));
        let fields = &switch[1 + padding..];
        let default = i32::from_be_bytes([fields[0], fields[1], fields[2], fields[3]]);
        let count = i32::from_be_bytes([fields[4], fields[5], fields[6], fields[7]]);
        let key = i32::from_be_bytes([fields[8], fields[9], fields[10], fields[11]]);
        let offset = i32::from_be_bytes([fields[12], fields[13], fields[14], fields[15]]);
        assert_eq!((default, count, key, offset), (size as i32, 1, 3, size as i32));
        assert_eq!((leading + 1 + padding) % 4, 0);
    }
}

#[test]
fn tableswitch_fills_gaps_with_default() {
    let mut body = CodeBody::new();
    let targets = vec![body.label("two"), body.label("five"), body.label("nine")];
    let default = body.label("default");
    let switch = SwitchLayout::table(vec![2, 5, 9], targets.clone(), Some(default));
    body.push(Instruction::switch(switch));
    for label in targets.iter().chain(Some(&default)) {
        body.place(*label).unwrap();
        body.push(Instruction::simple(Opcode::RETURN));
    }

    let (bytes, _) = encode_body(body);
    let words: Vec<i32> = bytes[4..]
        .chunks(4)
        .take(3 + 8)
        .map(|w| i32::from_be_bytes([w[0], w[1], w[2], w[3]]))
        .collect();
    // switch is 4 + 12 + 32 = 48 bytes, followed by one return per label
    assert_eq!(&words[0..3], &[51, 2, 9]);
    assert_eq!(&words[3..], &[48, 51, 51, 49, 51, 51, 51, 50]);
}

#[test]
fn ldc_index_too_large_is_fatal() {
    init_logging();
    let mut class = empty_class("A");
    let mut last = None;
    for i in 0..300 {
        last = Some(class.pool.integer(i).unwrap());
    }
    let mut body = CodeBody::new();
    body.push(Instruction::constant(Opcode::LDC, last.unwrap()));
    add_method(&mut class, "big", CodeAttribute::new(1, 0, body));

    let result = class.assemble(&mut Diagnostics::new(), &mut Vec::<u8>::new());
    match result {
        Err(Error::LdcIndexOverflow { method, pc, index }) => {
            assert_eq!((method.as_str(), pc), ("big", 0));
            assert!(index > 255);
        }
        other => panic!("expected ldc overflow, got {:?}", other),
    }
}

#[test]
fn branch_overflow_is_a_warning() {
    let mut body = CodeBody::new();
    body.push(Instruction::value(Opcode::IFEQ, 40_000).at(Position(12)));
    let (bytes, diagnostics) = encode_body(body);

    assert_eq!(bytes, vec![0x99, 0x9C, 0x40]);
    assert_eq!(diagnostics.warnings().len(), 1);
    assert_eq!(diagnostics.warnings()[0].id, "warn.operand.overflow");
    assert_eq!(diagnostics.warnings()[0].position, Position(12));
}

#[test]
fn catch_all_handler_writes_zero() {
    let mut body = CodeBody::new();
    let start = body.label("start");
    let end = body.label("end");
    body.place(start).unwrap();
    body.push(Instruction::simple(Opcode::RETURN));
    body.place(end).unwrap();
    body.push(Instruction::simple(Opcode::ATHROW));
    body.layout("test").unwrap();

    let mut code = CodeAttribute::new(1, 0, body);
    code.exception_table.push(ExceptionHandler {
        start,
        end,
        handler: end,
        catch_type: None,
    });
    let mut pool = ConstPool::new();
    pool.finalize(&mut Diagnostics::new()).unwrap();
    let mut reporter = IgnoreWarnings;
    let mut ctx = WriteContext::new(&pool, &mut reporter);
    let mut bytes: Vec<u8> = vec![];
    code.write(&mut ctx, &mut bytes).unwrap();

    assert_eq!(bytes.len() as u32, code.length());
    assert_eq!(
        bytes,
        vec![0, 1, 0, 0, 0, 0, 0, 2, 0xB1, 0xBF, 0, 1, 0, 0, 0, 1, 0, 1, 0, 0, 0, 0]
    );
}

#[test]
fn bootstrap_methods_attribute_is_added() {
    init_logging();
    let mut class = empty_class("A");
    let target = class
        .pool
        .method_ref("A", "bootstrap", "()Ljava/lang/invoke/CallSite;")
        .unwrap();
    let handle = class.pool.method_handle(HandleKind::InvokeStatic, target).unwrap();
    let bootstrap = class.pool.bootstrap(handle, vec![]).unwrap();
    let call_site = class.pool.invoke_dynamic(bootstrap, "run", "()V").unwrap();

    let mut body = CodeBody::new();
    body.push(Instruction::constant(Opcode::INVOKEDYNAMIC, call_site));
    body.push(Instruction::simple(Opcode::RETURN));
    add_method(&mut class, "go", CodeAttribute::new(0, 0, body));

    let mut bytes: Vec<u8> = vec![];
    class.assemble(&mut Diagnostics::new(), &mut bytes).unwrap();
    let table = class
        .attributes
        .iter()
        .find(|attribute| attribute.body.name() == "BootstrapMethods")
        .expect("bootstrap methods attribute");
    assert_eq!(table.info_length(), 2 + 4);

    // Assembling again doesn't add a second table
    class.assemble(&mut Diagnostics::new(), &mut Vec::<u8>::new()).unwrap();
    assert_eq!(class.attributes.len(), 1);
}

#[test]
fn batch_continues_past_failures() {
    init_logging();
    let output = std::env::temp_dir().join(format!("jasm-batch-{}", std::process::id()));

    let mut broken = empty_class("me/alec/Broken");
    let dangling = broken.pool.reference(9000, Position(3)).unwrap();
    broken.interfaces.push(dangling);
    let fine = empty_class("me/alec/Fine");

    let mut warned = empty_class("me/alec/Warned");
    let zero = warned.pool.reference(0, Position(5)).unwrap();
    warned.interfaces.push(zero);

    let jobs = vec![
        Job { source: "broken.jasm".to_owned(), class: broken },
        Job { source: "fine.jasm".to_owned(), class: fine },
    ];
    let settings = Settings::new(&output);
    let outcome = assemble_all(jobs, &settings);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].0, "broken.jasm");
    assert!(matches!(outcome.failed[0].1, Failure::Error(Error::InvalidConstantReference(9000))));
    assert_eq!(outcome.written, vec![output.join("me/alec/Fine.class")]);
    assert!(output.join("me/alec/Fine.class").exists());
    assert!(!output.join("me/alec/Broken.class").exists());

    let mut strict = Settings::new(&output);
    strict.strict = true;
    strict.no_write = true;
    let jobs = vec![Job { source: "warned.jasm".to_owned(), class: warned }];
    let outcome = assemble_all(jobs, &strict);
    assert!(!outcome.is_success());
    match &outcome.failed[0].1 {
        Failure::Warnings(warnings) => assert_eq!(warnings[0].id, "warn.cpool.zero.ref"),
        other => panic!("expected warnings, got {:?}", other),
    }

    let _ = std::fs::remove_dir_all(&output);
}

/// Write a standalone attribute, checking it against its computed length
fn write_attribute(pool: &ConstPool, attribute: &Attribute) -> Vec<u8> {
    let mut reporter = IgnoreWarnings;
    let mut ctx = WriteContext::new(pool, &mut reporter);
    let mut writer = CountingWriter::new(Vec::<u8>::new());
    attribute.write(&mut ctx, &mut writer).unwrap();
    assert_eq!(writer.written(), attribute.length() as u64);
    writer.into_inner()
}

#[test]
fn record_components_carry_attributes() {
    let mut pool = ConstPool::new();
    let name = pool.utf8("x").unwrap();
    let descriptor = pool.utf8("I").unwrap();
    let signature = pool.utf8("TT;").unwrap();
    let signature = Attribute::new(&mut pool, AttributeBody::Signature(signature)).unwrap();
    let components = VectorAttribute::new(vec![RecordComponent {
        name,
        descriptor,
        attributes: vec![signature],
    }]);
    let record = Attribute::new(&mut pool, AttributeBody::Record(components)).unwrap();
    pool.finalize(&mut Diagnostics::new()).unwrap();

    assert_eq!(record.info_length(), 16);
    assert_eq!(
        write_attribute(&pool, &record),
        vec![0, 5, 0, 0, 0, 16, 0, 1, 0, 1, 0, 2, 0, 1, 0, 4, 0, 0, 0, 2, 0, 3]
    );
}

#[test]
fn bootstrap_method_arguments() {
    let mut pool = ConstPool::new();
    let target = pool.method_ref("A", "bsm", "()V").unwrap();
    let handle = pool.method_handle(HandleKind::InvokeStatic, target).unwrap();
    let string = pool.string("x").unwrap();
    let integer = pool.integer(5).unwrap();
    pool.bootstrap(handle, vec![string, integer]).unwrap();
    let methods = pool.bootstrap_methods().to_vec();
    let table = Attribute::new(&mut pool, AttributeBody::BootstrapMethods(VectorAttribute::new(methods))).unwrap();
    pool.finalize(&mut Diagnostics::new()).unwrap();

    assert_eq!(table.info_length(), 2 + 4 + 2 * 2);
    assert_eq!(
        write_attribute(&pool, &table),
        vec![0, 11, 0, 0, 0, 10, 0, 1, 0, 7, 0, 2, 0, 9, 0, 10]
    );
}

#[test]
fn lookupswitch_keeps_key_order() {
    let mut body = CodeBody::new();
    let targets = vec![body.label("a"), body.label("b"), body.label("c")];
    let default = body.label("default");
    let switch = SwitchLayout::lookup(vec![9, -3, 4], targets.clone(), Some(default));
    body.push(Instruction::switch(switch));
    for label in targets.iter().chain(Some(&default)) {
        body.place(*label).unwrap();
        body.push(Instruction::simple(Opcode::RETURN));
    }

    let (bytes, _) = encode_body(body);
    let words: Vec<i32> = bytes[4..36]
        .chunks(4)
        .map(|w| i32::from_be_bytes([w[0], w[1], w[2], w[3]]))
        .collect();
    assert_eq!(bytes[0], 0xAB);
    assert_eq!(words, vec![39, 3, 9, 36, -3, 37, 4, 38]);
}

#[test]
fn unset_this_class_is_fatal() {
    let mut class = ClassModel::new(Version::JAVA8, ClassAccessFlags::PUBLIC);
    let result = class.assemble(&mut Diagnostics::new(), &mut Vec::<u8>::new());
    assert!(matches!(result, Err(Error::MissingReference("this_class"))));
}

#[test]
fn unset_attribute_reference_is_fatal() {
    let mut class = empty_class("A");
    let source = Attribute::new(&mut class.pool, AttributeBody::SourceFile(ConstCell::ZERO)).unwrap();
    class.attributes.push(source);
    let result = class.assemble(&mut Diagnostics::new(), &mut Vec::<u8>::new());
    assert!(matches!(result, Err(Error::MissingReference(_))));
}

#[test]
fn write_context_is_restored_after_errors() {
    let mut pool = ConstPool::new();
    let name = pool.utf8("broken").unwrap();
    let mut body = CodeBody::new();
    body.push(Instruction::simple(Opcode::GETFIELD));
    body.layout("broken").unwrap();
    let method = Method {
        access_flags: MethodAccessFlags::PUBLIC,
        name,
        descriptor: ConstCell::ZERO,
        attributes: vec![],
    };
    pool.finalize(&mut Diagnostics::new()).unwrap();

    let mut reporter = IgnoreWarnings;
    let mut ctx = WriteContext::new(&pool, &mut reporter);
    ctx.method = Some("outer".to_owned());
    assert!(method.write(&mut ctx, &mut Vec::<u8>::new()).is_err());
    assert_eq!(ctx.method.as_deref(), Some("outer"));

    assert!(body.write_code(&mut ctx, &mut Vec::<u8>::new()).is_err());
    assert!(ctx.code.is_none());
}
