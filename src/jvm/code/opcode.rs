use crate::jvm::Error;
use std::fmt;

/// Operation code of an instruction
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Opcode from the standard one byte table
    Standard(u8),

    /// Two byte opcode prefixed with `0xFE` (`impdep1`)
    Privileged(u8),

    /// Two byte opcode prefixed with `0xFF` (`impdep2`)
    NonPrivileged(u8),
}

impl Opcode {
    pub const PRIVILEGED_PREFIX: u8 = 0xFE;
    pub const NON_PRIVILEGED_PREFIX: u8 = 0xFF;

    /// Table entry for standard opcodes
    pub fn info(self) -> Result<&'static OpcodeInfo, Error> {
        match self {
            Opcode::Standard(byte) => OpcodeInfo::lookup(byte).ok_or(Error::UnknownOpcode(byte)),
            Opcode::Privileged(_) => Err(Error::UnknownOpcode(Opcode::PRIVILEGED_PREFIX)),
            Opcode::NonPrivileged(_) => Err(Error::UnknownOpcode(Opcode::NON_PRIVILEGED_PREFIX)),
        }
    }

    /// Human readable name, for diagnostics
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Standard(byte) => OpcodeInfo::lookup(byte).map_or("<unknown>", |info| info.mnemonic),
            Opcode::Privileged(_) => "<privileged>",
            Opcode::NonPrivileged(_) => "<nonprivileged>",
        }
    }

    /// Look up a standard opcode by its mnemonic
    pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
        OPCODES
            .iter()
            .find(|info| info.mnemonic == mnemonic)
            .map(|info| Opcode::Standard(info.byte))
    }
}

impl fmt::Debug for Opcode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::Standard(_) => formatter.write_str(self.mnemonic()),
            Opcode::Privileged(byte) => write!(formatter, "priv {:#04x}", byte),
            Opcode::NonPrivileged(byte) => write!(formatter, "nonpriv {:#04x}", byte),
        }
    }
}

/// Shape of the operand bytes following an opcode
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum OperandKind {
    /// No operand
    None,

    /// Signed byte (`bipush`)
    Byte,

    /// Signed short (`sipush`)
    Short,

    /// Unsigned byte index of a local variable
    Local,

    /// Unsigned byte array element type (`newarray`)
    ArrayType,

    /// Unsigned byte pool index (`ldc`)
    Const,

    /// Unsigned short pool index
    ConstShort,

    /// Signed short branch offset
    Branch,

    /// Signed int branch offset
    BranchWide,

    /// Local index and signed byte increment
    IInc,

    /// Pool index and dimension count
    MultiANewArray,

    /// Pool index, argument count, and a zero byte
    InvokeInterface,

    /// Pool index and two zero bytes
    InvokeDynamic,

    /// Aligned jump table
    TableSwitch,

    /// Aligned key/offset table
    LookupSwitch,

    /// Prefix widening the next instruction
    Wide,
}

impl OperandKind {
    /// Whether the operand is checked against the signed range of its width
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            OperandKind::Byte | OperandKind::Short | OperandKind::Branch | OperandKind::BranchWide
        )
    }

    pub fn is_branch(self) -> bool {
        matches!(self, OperandKind::Branch | OperandKind::BranchWide)
    }
}

/// Opcode table entry
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct OpcodeInfo {
    pub mnemonic: &'static str,
    pub byte: u8,

    /// Total length of the instruction, opcode included (0 if variable)
    pub length: u8,

    pub kind: OperandKind,
}

impl OpcodeInfo {
    pub fn lookup(byte: u8) -> Option<&'static OpcodeInfo> {
        OPCODES.get(byte as usize).filter(|info| info.byte == byte)
    }
}

macro_rules! opcodes {
    ($($name:ident = $byte:literal, $mnemonic:literal, $length:literal, $kind:ident;)*) => {
        impl Opcode {
            $(pub const $name: Opcode = Opcode::Standard($byte);)*
        }

        /// Standard opcodes, indexed by their byte
        pub static OPCODES: &[OpcodeInfo] = &[
            $(OpcodeInfo { mnemonic: $mnemonic, byte: $byte, length: $length, kind: OperandKind::$kind },)*
        ];
    };
}

opcodes! {
    NOP = 0x00, "nop", 1, None;
    ACONST_NULL = 0x01, "aconst_null", 1, None;
    ICONST_M1 = 0x02, "iconst_m1", 1, None;
    ICONST_0 = 0x03, "iconst_0", 1, None;
    ICONST_1 = 0x04, "iconst_1", 1, None;
    ICONST_2 = 0x05, "iconst_2", 1, None;
    ICONST_3 = 0x06, "iconst_3", 1, None;
    ICONST_4 = 0x07, "iconst_4", 1, None;
    ICONST_5 = 0x08, "iconst_5", 1, None;
    LCONST_0 = 0x09, "lconst_0", 1, None;
    LCONST_1 = 0x0A, "lconst_1", 1, None;
    FCONST_0 = 0x0B, "fconst_0", 1, None;
    FCONST_1 = 0x0C, "fconst_1", 1, None;
    FCONST_2 = 0x0D, "fconst_2", 1, None;
    DCONST_0 = 0x0E, "dconst_0", 1, None;
    DCONST_1 = 0x0F, "dconst_1", 1, None;
    BIPUSH = 0x10, "bipush", 2, Byte;
    SIPUSH = 0x11, "sipush", 3, Short;
    LDC = 0x12, "ldc", 2, Const;
    LDC_W = 0x13, "ldc_w", 3, ConstShort;
    LDC2_W = 0x14, "ldc2_w", 3, ConstShort;
    ILOAD = 0x15, "iload", 2, Local;
    LLOAD = 0x16, "lload", 2, Local;
    FLOAD = 0x17, "fload", 2, Local;
    DLOAD = 0x18, "dload", 2, Local;
    ALOAD = 0x19, "aload", 2, Local;
    ILOAD_0 = 0x1A, "iload_0", 1, None;
    ILOAD_1 = 0x1B, "iload_1", 1, None;
    ILOAD_2 = 0x1C, "iload_2", 1, None;
    ILOAD_3 = 0x1D, "iload_3", 1, None;
    LLOAD_0 = 0x1E, "lload_0", 1, None;
    LLOAD_1 = 0x1F, "lload_1", 1, None;
    LLOAD_2 = 0x20, "lload_2", 1, None;
    LLOAD_3 = 0x21, "lload_3", 1, None;
    FLOAD_0 = 0x22, "fload_0", 1, None;
    FLOAD_1 = 0x23, "fload_1", 1, None;
    FLOAD_2 = 0x24, "fload_2", 1, None;
    FLOAD_3 = 0x25, "fload_3", 1, None;
    DLOAD_0 = 0x26, "dload_0", 1, None;
    DLOAD_1 = 0x27, "dload_1", 1, None;
    DLOAD_2 = 0x28, "dload_2", 1, None;
    DLOAD_3 = 0x29, "dload_3", 1, None;
    ALOAD_0 = 0x2A, "aload_0", 1, None;
    ALOAD_1 = 0x2B, "aload_1", 1, None;
    ALOAD_2 = 0x2C, "aload_2", 1, None;
    ALOAD_3 = 0x2D, "aload_3", 1, None;
    IALOAD = 0x2E, "iaload", 1, None;
    LALOAD = 0x2F, "laload", 1, None;
    FALOAD = 0x30, "faload", 1, None;
    DALOAD = 0x31, "daload", 1, None;
    AALOAD = 0x32, "aaload", 1, None;
    BALOAD = 0x33, "baload", 1, None;
    CALOAD = 0x34, "caload", 1, None;
    SALOAD = 0x35, "saload", 1, None;
    ISTORE = 0x36, "istore", 2, Local;
    LSTORE = 0x37, "lstore", 2, Local;
    FSTORE = 0x38, "fstore", 2, Local;
    DSTORE = 0x39, "dstore", 2, Local;
    ASTORE = 0x3A, "astore", 2, Local;
    ISTORE_0 = 0x3B, "istore_0", 1, None;
    ISTORE_1 = 0x3C, "istore_1", 1, None;
    ISTORE_2 = 0x3D, "istore_2", 1, None;
    ISTORE_3 = 0x3E, "istore_3", 1, None;
    LSTORE_0 = 0x3F, "lstore_0", 1, None;
    LSTORE_1 = 0x40, "lstore_1", 1, None;
    LSTORE_2 = 0x41, "lstore_2", 1, None;
    LSTORE_3 = 0x42, "lstore_3", 1, None;
    FSTORE_0 = 0x43, "fstore_0", 1, None;
    FSTORE_1 = 0x44, "fstore_1", 1, None;
    FSTORE_2 = 0x45, "fstore_2", 1, None;
    FSTORE_3 = 0x46, "fstore_3", 1, None;
    DSTORE_0 = 0x47, "dstore_0", 1, None;
    DSTORE_1 = 0x48, "dstore_1", 1, None;
    DSTORE_2 = 0x49, "dstore_2", 1, None;
    DSTORE_3 = 0x4A, "dstore_3", 1, None;
    ASTORE_0 = 0x4B, "astore_0", 1, None;
    ASTORE_1 = 0x4C, "astore_1", 1, None;
    ASTORE_2 = 0x4D, "astore_2", 1, None;
    ASTORE_3 = 0x4E, "astore_3", 1, None;
    IASTORE = 0x4F, "iastore", 1, None;
    LASTORE = 0x50, "lastore", 1, None;
    FASTORE = 0x51, "fastore", 1, None;
    DASTORE = 0x52, "dastore", 1, None;
    AASTORE = 0x53, "aastore", 1, None;
    BASTORE = 0x54, "bastore", 1, None;
    CASTORE = 0x55, "castore", 1, None;
    SASTORE = 0x56, "sastore", 1, None;
    POP = 0x57, "pop", 1, None;
    POP2 = 0x58, "pop2", 1, None;
    DUP = 0x59, "dup", 1, None;
    DUP_X1 = 0x5A, "dup_x1", 1, None;
    DUP_X2 = 0x5B, "dup_x2", 1, None;
    DUP2 = 0x5C, "dup2", 1, None;
    DUP2_X1 = 0x5D, "dup2_x1", 1, None;
    DUP2_X2 = 0x5E, "dup2_x2", 1, None;
    SWAP = 0x5F, "swap", 1, None;
    IADD = 0x60, "iadd", 1, None;
    LADD = 0x61, "ladd", 1, None;
    FADD = 0x62, "fadd", 1, None;
    DADD = 0x63, "dadd", 1, None;
    ISUB = 0x64, "isub", 1, None;
    LSUB = 0x65, "lsub", 1, None;
    FSUB = 0x66, "fsub", 1, None;
    DSUB = 0x67, "dsub", 1, None;
    IMUL = 0x68, "imul", 1, None;
    LMUL = 0x69, "lmul", 1, None;
    FMUL = 0x6A, "fmul", 1, None;
    DMUL = 0x6B, "dmul", 1, None;
    IDIV = 0x6C, "idiv", 1, None;
    LDIV = 0x6D, "ldiv", 1, None;
    FDIV = 0x6E, "fdiv", 1, None;
    DDIV = 0x6F, "ddiv", 1, None;
    IREM = 0x70, "irem", 1, None;
    LREM = 0x71, "lrem", 1, None;
    FREM = 0x72, "frem", 1, None;
    DREM = 0x73, "drem", 1, None;
    INEG = 0x74, "ineg", 1, None;
    LNEG = 0x75, "lneg", 1, None;
    FNEG = 0x76, "fneg", 1, None;
    DNEG = 0x77, "dneg", 1, None;
    ISHL = 0x78, "ishl", 1, None;
    LSHL = 0x79, "lshl", 1, None;
    ISHR = 0x7A, "ishr", 1, None;
    LSHR = 0x7B, "lshr", 1, None;
    IUSHR = 0x7C, "iushr", 1, None;
    LUSHR = 0x7D, "lushr", 1, None;
    IAND = 0x7E, "iand", 1, None;
    LAND = 0x7F, "land", 1, None;
    IOR = 0x80, "ior", 1, None;
    LOR = 0x81, "lor", 1, None;
    IXOR = 0x82, "ixor", 1, None;
    LXOR = 0x83, "lxor", 1, None;
    IINC = 0x84, "iinc", 3, IInc;
    I2L = 0x85, "i2l", 1, None;
    I2F = 0x86, "i2f", 1, None;
    I2D = 0x87, "i2d", 1, None;
    L2I = 0x88, "l2i", 1, None;
    L2F = 0x89, "l2f", 1, None;
    L2D = 0x8A, "l2d", 1, None;
    F2I = 0x8B, "f2i", 1, None;
    F2L = 0x8C, "f2l", 1, None;
    F2D = 0x8D, "f2d", 1, None;
    D2I = 0x8E, "d2i", 1, None;
    D2L = 0x8F, "d2l", 1, None;
    D2F = 0x90, "d2f", 1, None;
    I2B = 0x91, "i2b", 1, None;
    I2C = 0x92, "i2c", 1, None;
    I2S = 0x93, "i2s", 1, None;
    LCMP = 0x94, "lcmp", 1, None;
    FCMPL = 0x95, "fcmpl", 1, None;
    FCMPG = 0x96, "fcmpg", 1, None;
    DCMPL = 0x97, "dcmpl", 1, None;
    DCMPG = 0x98, "dcmpg", 1, None;
    IFEQ = 0x99, "ifeq", 3, Branch;
    IFNE = 0x9A, "ifne", 3, Branch;
    IFLT = 0x9B, "iflt", 3, Branch;
    IFGE = 0x9C, "ifge", 3, Branch;
    IFGT = 0x9D, "ifgt", 3, Branch;
    IFLE = 0x9E, "ifle", 3, Branch;
    IF_ICMPEQ = 0x9F, "if_icmpeq", 3, Branch;
    IF_ICMPNE = 0xA0, "if_icmpne", 3, Branch;
    IF_ICMPLT = 0xA1, "if_icmplt", 3, Branch;
    IF_ICMPGE = 0xA2, "if_icmpge", 3, Branch;
    IF_ICMPGT = 0xA3, "if_icmpgt", 3, Branch;
    IF_ICMPLE = 0xA4, "if_icmple", 3, Branch;
    IF_ACMPEQ = 0xA5, "if_acmpeq", 3, Branch;
    IF_ACMPNE = 0xA6, "if_acmpne", 3, Branch;
    GOTO = 0xA7, "goto", 3, Branch;
    JSR = 0xA8, "jsr", 3, Branch;
    RET = 0xA9, "ret", 2, Local;
    TABLESWITCH = 0xAA, "tableswitch", 0, TableSwitch;
    LOOKUPSWITCH = 0xAB, "lookupswitch", 0, LookupSwitch;
    IRETURN = 0xAC, "ireturn", 1, None;
    LRETURN = 0xAD, "lreturn", 1, None;
    FRETURN = 0xAE, "freturn", 1, None;
    DRETURN = 0xAF, "dreturn", 1, None;
    ARETURN = 0xB0, "areturn", 1, None;
    RETURN = 0xB1, "return", 1, None;
    GETSTATIC = 0xB2, "getstatic", 3, ConstShort;
    PUTSTATIC = 0xB3, "putstatic", 3, ConstShort;
    GETFIELD = 0xB4, "getfield", 3, ConstShort;
    PUTFIELD = 0xB5, "putfield", 3, ConstShort;
    INVOKEVIRTUAL = 0xB6, "invokevirtual", 3, ConstShort;
    INVOKESPECIAL = 0xB7, "invokespecial", 3, ConstShort;
    INVOKESTATIC = 0xB8, "invokestatic", 3, ConstShort;
    INVOKEINTERFACE = 0xB9, "invokeinterface", 5, InvokeInterface;
    INVOKEDYNAMIC = 0xBA, "invokedynamic", 5, InvokeDynamic;
    NEW = 0xBB, "new", 3, ConstShort;
    NEWARRAY = 0xBC, "newarray", 2, ArrayType;
    ANEWARRAY = 0xBD, "anewarray", 3, ConstShort;
    ARRAYLENGTH = 0xBE, "arraylength", 1, None;
    ATHROW = 0xBF, "athrow", 1, None;
    CHECKCAST = 0xC0, "checkcast", 3, ConstShort;
    INSTANCEOF = 0xC1, "instanceof", 3, ConstShort;
    MONITORENTER = 0xC2, "monitorenter", 1, None;
    MONITOREXIT = 0xC3, "monitorexit", 1, None;
    WIDE = 0xC4, "wide", 0, Wide;
    MULTIANEWARRAY = 0xC5, "multianewarray", 4, MultiANewArray;
    IFNULL = 0xC6, "ifnull", 3, Branch;
    IFNONNULL = 0xC7, "ifnonnull", 3, Branch;
    GOTO_W = 0xC8, "goto_w", 5, BranchWide;
    JSR_W = 0xC9, "jsr_w", 5, BranchWide;
    BREAKPOINT = 0xCA, "breakpoint", 1, None;
}
