// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: BUSL-1.1

//! TPM 1.2 constants: packet tags, command ordinals and result codes
//!
//! Catalog values follow TPM Main Part 2 (Structures) and Part 3 (Commands),
//! Level 2 Version 1.2, Revision 116.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::{DecodeError, Result};
use crate::marshal::*;

/// SHA-1 is hardcoded in TPM 1.2
pub const DIGEST_SIZE: usize = 20;

/// tag (2) + paramSize (4)
pub const PACKET_PREFIX_SIZE: usize = 6;

/// tag (2) + paramSize (4) + ordinal or returnCode (4)
pub const PACKET_HEADER_SIZE: usize = 10;

/// Defines a wire enumeration that keeps values outside its catalog.
macro_rules! tpm_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident : $repr:ty {
            $( $variant:ident = $value:literal => $wire:literal, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )*
            Unknown($repr),
        }

        impl $name {
            /// Every cataloged value, in declaration order
            pub const KNOWN: &[$name] = &[ $( $name::$variant, )* ];

            pub fn from_raw(v: $repr) -> Self {
                match v {
                    $( $value => $name::$variant, )*
                    other => $name::Unknown(other),
                }
            }

            pub fn to_raw(self) -> $repr {
                match self {
                    $( $name::$variant => $value, )*
                    $name::Unknown(v) => v,
                }
            }

            /// Protocol name, `None` for uncataloged values
            pub fn name(self) -> Option<&'static str> {
                match self {
                    $( $name::$variant => Some($wire), )*
                    $name::Unknown(_) => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.name() {
                    Some(name) => f.write_str(name),
                    None => write!(
                        f,
                        "0x{:0width$x}",
                        self.to_raw(),
                        width = 2 * std::mem::size_of::<$repr>()
                    ),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl Marshal for $name {
            fn marshal(&self, buf: &mut PacketWriter) {
                self.to_raw().marshal(buf);
            }
        }

        impl Unmarshal for $name {
            fn unmarshal(buf: &mut PacketReader<'_>) -> Result<Self> {
                Ok(Self::from_raw(<$repr>::unmarshal(buf)?))
            }
        }
    };
}

/// TPM 1.2 packet tag (TPM_TAG)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TpmTag {
    #[serde(rename = "TPM_TAG_RQU_COMMAND")]
    RquCommand,
    #[serde(rename = "TPM_TAG_RQU_AUTH1_COMMAND")]
    RquAuth1Command,
    #[serde(rename = "TPM_TAG_RQU_AUTH2_COMMAND")]
    RquAuth2Command,
    #[serde(rename = "TPM_TAG_RSP_COMMAND")]
    RspCommand,
    #[serde(rename = "TPM_TAG_RSP_AUTH1_COMMAND")]
    RspAuth1Command,
    #[serde(rename = "TPM_TAG_RSP_AUTH2_COMMAND")]
    RspAuth2Command,
}

impl TpmTag {
    pub fn to_u16(self) -> u16 {
        match self {
            TpmTag::RquCommand => 0x00C1,
            TpmTag::RquAuth1Command => 0x00C2,
            TpmTag::RquAuth2Command => 0x00C3,
            TpmTag::RspCommand => 0x00C4,
            TpmTag::RspAuth1Command => 0x00C5,
            TpmTag::RspAuth2Command => 0x00C6,
        }
    }

    pub fn from_u16(v: u16) -> Option<Self> {
        match v {
            0x00C1 => Some(TpmTag::RquCommand),
            0x00C2 => Some(TpmTag::RquAuth1Command),
            0x00C3 => Some(TpmTag::RquAuth2Command),
            0x00C4 => Some(TpmTag::RspCommand),
            0x00C5 => Some(TpmTag::RspAuth1Command),
            0x00C6 => Some(TpmTag::RspAuth2Command),
            _ => None,
        }
    }

    pub fn is_request(self) -> bool {
        matches!(
            self,
            TpmTag::RquCommand | TpmTag::RquAuth1Command | TpmTag::RquAuth2Command
        )
    }

    pub fn is_response(self) -> bool {
        !self.is_request()
    }

    /// Number of authorization sessions carried with the command
    pub fn auth_sessions(self) -> u8 {
        match self {
            TpmTag::RquCommand | TpmTag::RspCommand => 0,
            TpmTag::RquAuth1Command | TpmTag::RspAuth1Command => 1,
            TpmTag::RquAuth2Command | TpmTag::RspAuth2Command => 2,
        }
    }
}

impl Marshal for TpmTag {
    fn marshal(&self, buf: &mut PacketWriter) {
        buf.put_u16(self.to_u16());
    }
}

impl Unmarshal for TpmTag {
    fn unmarshal(buf: &mut PacketReader<'_>) -> Result<Self> {
        let raw = buf.get_u16()?;
        Self::from_u16(raw).ok_or(DecodeError::UnknownTag(raw))
    }
}

tpm_enum! {
    /// TPM 1.2 command ordinals (TPM_COMMAND_CODE)
    pub enum TpmOrdinal: u32 {
        Oiap = 0x0000000A => "TPM_OIAP",
        Osap = 0x0000000B => "TPM_OSAP",
        ChangeAuth = 0x0000000C => "TPM_ChangeAuth",
        TakeOwnership = 0x0000000D => "TPM_TakeOwnership",
        ChangeAuthAsymStart = 0x0000000E => "TPM_ChangeAuthAsymStart",
        ChangeAuthAsymFinish = 0x0000000F => "TPM_ChangeAuthAsymFinish",
        ChangeAuthOwner = 0x00000010 => "TPM_ChangeAuthOwner",
        Dsap = 0x00000011 => "TPM_DSAP",
        CmkCreateTicket = 0x00000012 => "TPM_CMK_CreateTicket",
        CmkCreateKey = 0x00000013 => "TPM_CMK_CreateKey",
        Extend = 0x00000014 => "TPM_Extend",
        PcrRead = 0x00000015 => "TPM_PcrRead",
        Quote = 0x00000016 => "TPM_Quote",
        Seal = 0x00000017 => "TPM_Seal",
        Unseal = 0x00000018 => "TPM_Unseal",
        DirWriteAuth = 0x00000019 => "TPM_DirWriteAuth",
        DirRead = 0x0000001A => "TPM_DirRead",
        CmkCreateBlob = 0x0000001B => "TPM_CMK_CreateBlob",
        CmkSetRestrictions = 0x0000001C => "TPM_CMK_SetRestrictions",
        CmkApproveMa = 0x0000001D => "TPM_CMK_ApproveMA",
        UnBind = 0x0000001E => "TPM_UnBind",
        CreateWrapKey = 0x0000001F => "TPM_CreateWrapKey",
        LoadKey = 0x00000020 => "TPM_LoadKey",
        GetPubKey = 0x00000021 => "TPM_GetPubKey",
        EvictKey = 0x00000022 => "TPM_EvictKey",
        KeyControlOwner = 0x00000023 => "TPM_KeyControlOwner",
        CmkConvertMigration = 0x00000024 => "TPM_CMK_ConvertMigration",
        MigrateKey = 0x00000025 => "TPM_MigrateKey",
        CreateMigrationBlob = 0x00000028 => "TPM_CreateMigrationBlob",
        DaaJoin = 0x00000029 => "TPM_DAA_Join",
        ConvertMigrationBlob = 0x0000002A => "TPM_ConvertMigrationBlob",
        AuthorizeMigrationKey = 0x0000002B => "TPM_AuthorizeMigrationKey",
        CreateMaintenanceArchive = 0x0000002C => "TPM_CreateMaintenanceArchive",
        LoadMaintenanceArchive = 0x0000002D => "TPM_LoadMaintenanceArchive",
        KillMaintenanceFeature = 0x0000002E => "TPM_KillMaintenanceFeature",
        LoadManuMaintPub = 0x0000002F => "TPM_LoadManuMaintPub",
        ReadManuMaintPub = 0x00000030 => "TPM_ReadManuMaintPub",
        DaaSign = 0x00000031 => "TPM_DAA_Sign",
        CertifyKey = 0x00000032 => "TPM_CertifyKey",
        CertifyKey2 = 0x00000033 => "TPM_CertifyKey2",
        Sign = 0x0000003C => "TPM_Sign",
        Sealx = 0x0000003D => "TPM_Sealx",
        Quote2 = 0x0000003E => "TPM_Quote2",
        SetCapability = 0x0000003F => "TPM_SetCapability",
        ResetLockValue = 0x00000040 => "TPM_ResetLockValue",
        LoadKey2 = 0x00000041 => "TPM_LoadKey2",
        GetRandom = 0x00000046 => "TPM_GetRandom",
        StirRandom = 0x00000047 => "TPM_StirRandom",
        SelfTestFull = 0x00000050 => "TPM_SelfTestFull",
        CertifySelfTest = 0x00000052 => "TPM_CertifySelfTest",
        ContinueSelfTest = 0x00000053 => "TPM_ContinueSelfTest",
        GetTestResult = 0x00000054 => "TPM_GetTestResult",
        Reset = 0x0000005A => "TPM_Reset",
        OwnerClear = 0x0000005B => "TPM_OwnerClear",
        DisableOwnerClear = 0x0000005C => "TPM_DisableOwnerClear",
        ForceClear = 0x0000005D => "TPM_ForceClear",
        DisableForceClear = 0x0000005E => "TPM_DisableForceClear",
        GetCapabilitySigned = 0x00000064 => "TPM_GetCapabilitySigned",
        GetCapability = 0x00000065 => "TPM_GetCapability",
        GetCapabilityOwner = 0x00000066 => "TPM_GetCapabilityOwner",
        OwnerSetDisable = 0x0000006E => "TPM_OwnerSetDisable",
        PhysicalEnable = 0x0000006F => "TPM_PhysicalEnable",
        PhysicalDisable = 0x00000070 => "TPM_PhysicalDisable",
        SetOwnerInstall = 0x00000071 => "TPM_SetOwnerInstall",
        PhysicalSetDeactivated = 0x00000072 => "TPM_PhysicalSetDeactivated",
        SetTempDeactivated = 0x00000073 => "TPM_SetTempDeactivated",
        SetOperatorAuth = 0x00000074 => "TPM_SetOperatorAuth",
        SetOwnerPointer = 0x00000075 => "TPM_SetOwnerPointer",
        CreateEndorsementKeyPair = 0x00000078 => "TPM_CreateEndorsementKeyPair",
        MakeIdentity = 0x00000079 => "TPM_MakeIdentity",
        ActivateIdentity = 0x0000007A => "TPM_ActivateIdentity",
        ReadPubek = 0x0000007C => "TPM_ReadPubek",
        OwnerReadPubek = 0x0000007D => "TPM_OwnerReadPubek",
        DisablePubekRead = 0x0000007E => "TPM_DisablePubekRead",
        CreateRevocableEk = 0x0000007F => "TPM_CreateRevocableEK",
        RevokeTrust = 0x00000080 => "TPM_RevokeTrust",
        OwnerReadInternalPub = 0x00000081 => "TPM_OwnerReadInternalPub",
        GetAuditEvent = 0x00000082 => "TPM_GetAuditEvent",
        GetAuditEventSigned = 0x00000083 => "TPM_GetAuditEventSigned",
        GetAuditDigest = 0x00000085 => "TPM_GetAuditDigest",
        GetAuditDigestSigned = 0x00000086 => "TPM_GetAuditDigestSigned",
        GetOrdinalAuditStatus = 0x0000008C => "TPM_GetOrdinalAuditStatus",
        SetOrdinalAuditStatus = 0x0000008D => "TPM_SetOrdinalAuditStatus",
        TerminateHandle = 0x00000096 => "TPM_Terminate_Handle",
        Init = 0x00000097 => "TPM_Init",
        SaveState = 0x00000098 => "TPM_SaveState",
        Startup = 0x00000099 => "TPM_Startup",
        SetRedirection = 0x0000009A => "TPM_SetRedirection",
        Sha1Start = 0x000000A0 => "TPM_SHA1Start",
        Sha1Update = 0x000000A1 => "TPM_SHA1Update",
        Sha1Complete = 0x000000A2 => "TPM_SHA1Complete",
        Sha1CompleteExtend = 0x000000A3 => "TPM_SHA1CompleteExtend",
        FieldUpgrade = 0x000000AA => "TPM_FieldUpgrade",
        SaveKeyContext = 0x000000B4 => "TPM_SaveKeyContext",
        LoadKeyContext = 0x000000B5 => "TPM_LoadKeyContext",
        SaveAuthContext = 0x000000B6 => "TPM_SaveAuthContext",
        LoadAuthContext = 0x000000B7 => "TPM_LoadAuthContext",
        SaveContext = 0x000000B8 => "TPM_SaveContext",
        LoadContext = 0x000000B9 => "TPM_LoadContext",
        FlushSpecific = 0x000000BA => "TPM_FlushSpecific",
        PcrReset = 0x000000C8 => "TPM_PCR_Reset",
        NvDefineSpace = 0x000000CC => "TPM_NV_DefineSpace",
        NvWriteValue = 0x000000CD => "TPM_NV_WriteValue",
        NvWriteValueAuth = 0x000000CE => "TPM_NV_WriteValueAuth",
        NvReadValue = 0x000000CF => "TPM_NV_ReadValue",
        NvReadValueAuth = 0x000000D0 => "TPM_NV_ReadValueAuth",
        DelegateUpdateVerification = 0x000000D1 => "TPM_Delegate_UpdateVerification",
        DelegateManage = 0x000000D2 => "TPM_Delegate_Manage",
        DelegateCreateKeyDelegation = 0x000000D4 => "TPM_Delegate_CreateKeyDelegation",
        DelegateCreateOwnerDelegation = 0x000000D5 => "TPM_Delegate_CreateOwnerDelegation",
        DelegateVerifyDelegation = 0x000000D6 => "TPM_Delegate_VerifyDelegation",
        DelegateLoadOwnerDelegation = 0x000000D8 => "TPM_Delegate_LoadOwnerDelegation",
        DelegateReadTable = 0x000000DB => "TPM_Delegate_ReadTable",
        CreateCounter = 0x000000DC => "TPM_CreateCounter",
        IncrementCounter = 0x000000DD => "TPM_IncrementCounter",
        ReadCounter = 0x000000DE => "TPM_ReadCounter",
        ReleaseCounter = 0x000000DF => "TPM_ReleaseCounter",
        ReleaseCounterOwner = 0x000000E0 => "TPM_ReleaseCounterOwner",
        EstablishTransport = 0x000000E6 => "TPM_EstablishTransport",
        ExecuteTransport = 0x000000E7 => "TPM_ExecuteTransport",
        ReleaseTransportSigned = 0x000000E8 => "TPM_ReleaseTransportSigned",
        GetTicks = 0x000000F1 => "TPM_GetTicks",
        TickStampBlob = 0x000000F2 => "TPM_TickStampBlob",
        TscPhysicalPresence = 0x4000000A => "TSC_PhysicalPresence",
        TscResetEstablishmentBit = 0x4000000B => "TSC_ResetEstablishmentBit",
    }
}

impl TpmOrdinal {
    /// Look up an ordinal by protocol name, with or without the `TPM_` prefix
    pub fn from_name(name: &str) -> Option<Self> {
        Self::KNOWN.iter().copied().find(|ordinal| {
            ordinal.name().is_some_and(|wire| {
                wire == name || wire.strip_prefix("TPM_").is_some_and(|short| short == name)
            })
        })
    }
}

/// Offset of the non-fatal result code range
pub const TPM_NON_FATAL: u32 = 0x00000800;

tpm_enum! {
    /// TPM 1.2 result codes (TPM_RESULT)
    pub enum TpmResult: u32 {
        Success = 0x00000000 => "TPM_SUCCESS",
        AuthFail = 0x00000001 => "TPM_AUTHFAIL",
        BadIndex = 0x00000002 => "TPM_BADINDEX",
        BadParameter = 0x00000003 => "TPM_BAD_PARAMETER",
        AuditFailure = 0x00000004 => "TPM_AUDITFAILURE",
        ClearDisabled = 0x00000005 => "TPM_CLEAR_DISABLED",
        Deactivated = 0x00000006 => "TPM_DEACTIVATED",
        Disabled = 0x00000007 => "TPM_DISABLED",
        DisabledCmd = 0x00000008 => "TPM_DISABLED_CMD",
        Fail = 0x00000009 => "TPM_FAIL",
        BadOrdinal = 0x0000000A => "TPM_BAD_ORDINAL",
        InstallDisabled = 0x0000000B => "TPM_INSTALL_DISABLED",
        InvalidKeyHandle = 0x0000000C => "TPM_INVALID_KEYHANDLE",
        KeyNotFound = 0x0000000D => "TPM_KEYNOTFOUND",
        InappropriateEnc = 0x0000000E => "TPM_INAPPROPRIATE_ENC",
        MigrateFail = 0x0000000F => "TPM_MIGRATEFAIL",
        InvalidPcrInfo = 0x00000010 => "TPM_INVALID_PCR_INFO",
        NoSpace = 0x00000011 => "TPM_NOSPACE",
        NoSrk = 0x00000012 => "TPM_NOSRK",
        NotSealedBlob = 0x00000013 => "TPM_NOTSEALED_BLOB",
        OwnerSet = 0x00000014 => "TPM_OWNER_SET",
        Resources = 0x00000015 => "TPM_RESOURCES",
        ShortRandom = 0x00000016 => "TPM_SHORTRANDOM",
        Size = 0x00000017 => "TPM_SIZE",
        WrongPcrVal = 0x00000018 => "TPM_WRONGPCRVAL",
        BadParamSize = 0x00000019 => "TPM_BAD_PARAM_SIZE",
        ShaThread = 0x0000001A => "TPM_SHA_THREAD",
        ShaError = 0x0000001B => "TPM_SHA_ERROR",
        FailedSelfTest = 0x0000001C => "TPM_FAILEDSELFTEST",
        Auth2Fail = 0x0000001D => "TPM_AUTH2FAIL",
        BadTag = 0x0000001E => "TPM_BADTAG",
        IoError = 0x0000001F => "TPM_IOERROR",
        EncryptError = 0x00000020 => "TPM_ENCRYPT_ERROR",
        DecryptError = 0x00000021 => "TPM_DECRYPT_ERROR",
        InvalidAuthHandle = 0x00000022 => "TPM_INVALID_AUTHHANDLE",
        NoEndorsement = 0x00000023 => "TPM_NO_ENDORSEMENT",
        InvalidKeyUsage = 0x00000024 => "TPM_INVALID_KEYUSAGE",
        WrongEntityType = 0x00000025 => "TPM_WRONG_ENTITYTYPE",
        InvalidPostInit = 0x00000026 => "TPM_INVALID_POSTINIT",
        InappropriateSig = 0x00000027 => "TPM_INAPPROPRIATE_SIG",
        BadKeyProperty = 0x00000028 => "TPM_BAD_KEY_PROPERTY",
        BadMigration = 0x00000029 => "TPM_BAD_MIGRATION",
        BadScheme = 0x0000002A => "TPM_BAD_SCHEME",
        BadDataSize = 0x0000002B => "TPM_BAD_DATASIZE",
        BadMode = 0x0000002C => "TPM_BAD_MODE",
        BadPresence = 0x0000002D => "TPM_BAD_PRESENCE",
        BadVersion = 0x0000002E => "TPM_BAD_VERSION",
        NoWrapTransport = 0x0000002F => "TPM_NO_WRAP_TRANSPORT",
        AuditFailUnsuccessful = 0x00000030 => "TPM_AUDITFAIL_UNSUCCESSFUL",
        AuditFailSuccessful = 0x00000031 => "TPM_AUDITFAIL_SUCCESSFUL",
        NotResetable = 0x00000032 => "TPM_NOTRESETABLE",
        NotLocal = 0x00000033 => "TPM_NOTLOCAL",
        BadType = 0x00000034 => "TPM_BAD_TYPE",
        InvalidResource = 0x00000035 => "TPM_INVALID_RESOURCE",
        NotFips = 0x00000036 => "TPM_NOTFIPS",
        InvalidFamily = 0x00000037 => "TPM_INVALID_FAMILY",
        NoNvPermission = 0x00000038 => "TPM_NO_NV_PERMISSION",
        RequiresSign = 0x00000039 => "TPM_REQUIRES_SIGN",
        KeyNotSupported = 0x0000003A => "TPM_KEY_NOTSUPPORTED",
        AuthConflict = 0x0000003B => "TPM_AUTH_CONFLICT",
        AreaLocked = 0x0000003C => "TPM_AREA_LOCKED",
        BadLocality = 0x0000003D => "TPM_BAD_LOCALITY",
        ReadOnly = 0x0000003E => "TPM_READ_ONLY",
        PerNoWrite = 0x0000003F => "TPM_PER_NOWRITE",
        FamilyCount = 0x00000040 => "TPM_FAMILYCOUNT",
        WriteLocked = 0x00000041 => "TPM_WRITE_LOCKED",
        BadAttributes = 0x00000042 => "TPM_BAD_ATTRIBUTES",
        InvalidStructure = 0x00000043 => "TPM_INVALID_STRUCTURE",
        KeyOwnerControl = 0x00000044 => "TPM_KEY_OWNER_CONTROL",
        BadCounter = 0x00000045 => "TPM_BAD_COUNTER",
        NotFullWrite = 0x00000046 => "TPM_NOT_FULLWRITE",
        ContextGap = 0x00000047 => "TPM_CONTEXT_GAP",
        MaxNvWrites = 0x00000048 => "TPM_MAXNVWRITES",
        NoOperator = 0x00000049 => "TPM_NOOPERATOR",
        ResourceMissing = 0x0000004A => "TPM_RESOURCEMISSING",
        DelegateLock = 0x0000004B => "TPM_DELEGATE_LOCK",
        DelegateFamily = 0x0000004C => "TPM_DELEGATE_FAMILY",
        DelegateAdmin = 0x0000004D => "TPM_DELEGATE_ADMIN",
        TransportNotExclusive = 0x0000004E => "TPM_TRANSPORT_NOTEXCLUSIVE",
        OwnerControl = 0x0000004F => "TPM_OWNER_CONTROL",
        DaaResources = 0x00000050 => "TPM_DAA_RESOURCES",
        DaaInputData0 = 0x00000051 => "TPM_DAA_INPUT_DATA0",
        DaaInputData1 = 0x00000052 => "TPM_DAA_INPUT_DATA1",
        DaaIssuerSettings = 0x00000053 => "TPM_DAA_ISSUER_SETTINGS",
        DaaTpmSettings = 0x00000054 => "TPM_DAA_TPM_SETTINGS",
        DaaStage = 0x00000055 => "TPM_DAA_STAGE",
        DaaIssuerValidity = 0x00000056 => "TPM_DAA_ISSUER_VALIDITY",
        DaaWrongW = 0x00000057 => "TPM_DAA_WRONG_W",
        BadHandle = 0x00000058 => "TPM_BAD_HANDLE",
        BadDelegate = 0x00000059 => "TPM_BAD_DELEGATE",
        BadContext = 0x0000005A => "TPM_BADCONTEXT",
        TooManyContexts = 0x0000005B => "TPM_TOOMANYCONTEXTS",
        MaTicketSignature = 0x0000005C => "TPM_MA_TICKET_SIGNATURE",
        MaDestination = 0x0000005D => "TPM_MA_DESTINATION",
        MaSource = 0x0000005E => "TPM_MA_SOURCE",
        MaAuthority = 0x0000005F => "TPM_MA_AUTHORITY",
        PermanentEk = 0x00000061 => "TPM_PERMANENTEK",
        BadSignature = 0x00000062 => "TPM_BAD_SIGNATURE",
        NoContextSpace = 0x00000063 => "TPM_NOCONTEXTSPACE",
        Retry = 0x00000800 => "TPM_RETRY",
        NeedsSelfTest = 0x00000801 => "TPM_NEEDS_SELFTEST",
        DoingSelfTest = 0x00000802 => "TPM_DOING_SELFTEST",
        DefendLockRunning = 0x00000803 => "TPM_DEFEND_LOCK_RUNNING",
    }
}

impl TpmResult {
    pub fn is_success(self) -> bool {
        matches!(self, TpmResult::Success)
    }

    /// Codes in the non-fatal range ask the caller to retry later
    pub fn is_non_fatal(self) -> bool {
        self.to_raw() & TPM_NON_FATAL != 0
    }
}

tpm_enum! {
    /// Payload type of a key or sealed blob (TPM_PAYLOAD_TYPE)
    pub enum TpmPayloadType: u8 {
        Asym = 0x01 => "TPM_PT_ASYM",
        Bind = 0x02 => "TPM_PT_BIND",
        Migrate = 0x03 => "TPM_PT_MIGRATE",
        Maint = 0x04 => "TPM_PT_MAINT",
        Seal = 0x05 => "TPM_PT_SEAL",
        MigrateRestricted = 0x06 => "TPM_PT_MIGRATE_RESTRICTED",
        MigrateExternal = 0x07 => "TPM_PT_MIGRATE_EXTERNAL",
        CmkMigrate = 0x08 => "TPM_PT_CMK_MIGRATE",
    }
}

impl TpmPayloadType {
    /// 0x80-0xFF are reserved for vendor payloads
    pub fn is_vendor(self) -> bool {
        self.to_raw() >= 0x80
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_classes() {
        for raw in 0x00C1..=0x00C3 {
            let tag = TpmTag::from_u16(raw).unwrap();
            assert!(tag.is_request());
            assert_eq!(tag.to_u16(), raw);
        }
        for raw in 0x00C4..=0x00C6 {
            assert!(TpmTag::from_u16(raw).unwrap().is_response());
        }
        assert_eq!(TpmTag::RquAuth2Command.auth_sessions(), 2);
        assert_eq!(TpmTag::RspCommand.auth_sessions(), 0);
        assert_eq!(TpmTag::from_u16(0x8001), None);
    }

    #[test]
    fn test_unknown_tag_error() {
        let err = TpmTag::from_bytes(&[0x80, 0x01]).unwrap_err();
        assert_eq!(err, DecodeError::UnknownTag(0x8001));
    }

    #[test]
    fn test_ordinal_lookup() {
        assert_eq!(TpmOrdinal::from_raw(0x18), TpmOrdinal::Unseal);
        assert_eq!(TpmOrdinal::Unseal.to_raw(), 0x18);
        assert_eq!(TpmOrdinal::from_name("TPM_Unseal"), Some(TpmOrdinal::Unseal));
        assert_eq!(TpmOrdinal::from_name("Unseal"), Some(TpmOrdinal::Unseal));
        assert_eq!(
            TpmOrdinal::from_name("TSC_PhysicalPresence"),
            Some(TpmOrdinal::TscPhysicalPresence)
        );
        assert_eq!(TpmOrdinal::from_name("compile"), None);
    }

    #[test]
    fn test_unknown_values_are_preserved() {
        let ordinal = TpmOrdinal::from_raw(0x0000_1234);
        assert_eq!(ordinal, TpmOrdinal::Unknown(0x1234));
        assert_eq!(ordinal.to_raw(), 0x1234);
        assert_eq!(ordinal.to_string(), "0x00001234");
        assert_eq!(TpmPayloadType::from_raw(0x90).to_string(), "0x90");
        assert!(TpmPayloadType::from_raw(0x90).is_vendor());
    }

    #[test]
    fn test_catalog_has_no_duplicates() {
        let mut raws: Vec<u32> = TpmOrdinal::KNOWN.iter().map(|o| o.to_raw()).collect();
        raws.sort_unstable();
        raws.dedup();
        assert_eq!(raws.len(), TpmOrdinal::KNOWN.len());
    }

    #[test]
    fn test_result_codes() {
        assert!(TpmResult::from_raw(0).is_success());
        assert!(!TpmResult::AuthFail.is_success());
        assert!(TpmResult::from_raw(0x802).is_non_fatal());
        assert_eq!(TpmResult::from_raw(0x802), TpmResult::DoingSelfTest);
        assert!(!TpmResult::Fail.is_non_fatal());
        assert_eq!(TpmResult::Retry.to_string(), "TPM_RETRY");
    }
}
