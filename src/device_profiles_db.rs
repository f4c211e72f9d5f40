// Built in role profile db. Ordering matters for classification, the most
// specific profiles come first (a Docker host also looks like a Linux server).
pub static ROLE_PROFILES: &str = r#"{
  "date": "March 12th 2025",
  "signature": "2f7c1d0a9e4b83c5a6d21f0b7e8c94d3125a0f6b4c8d9e1a3b5c7d9f0e2a4c6b",
  "profiles": [
    {
      "device_type": "container-host",
      "hostname_prefixes": [ "k8s-node", "docker" ],
      "vendors": [ "Dell Inc.", "Supermicro" ],
      "sys_descrs": [
        "Linux 6.8.0-39-generic Docker 26.1.4",
        "Talos v1.7.4 containerd 1.7.16"
      ],
      "services": [ "docker", "kubelet" ],
      "conditions": [
        {
          "Node": {
            "type": "OR",
            "sub_conditions": [
              { "Leaf": { "sys_descrs": [ "docker", "containerd" ] } },
              { "Leaf": { "services": [ "kubelet" ] } },
              { "Leaf": { "hostnames": [ "k8s-node", "docker" ] } }
            ]
          }
        }
      ]
    },
    {
      "device_type": "hypervisor",
      "hostname_prefixes": [ "esx", "hv" ],
      "vendors": [ "VMware, Inc.", "Proxmox Server Solutions" ],
      "sys_descrs": [
        "VMware ESXi 8.0.2 build-23305546",
        "Proxmox VE 8.2.2 Linux 6.8.4-2-pve"
      ],
      "services": [ "vmotion", "nfs" ],
      "conditions": [
        {
          "Node": {
            "type": "OR",
            "sub_conditions": [
              { "Leaf": { "sys_descrs": [ "esxi", "proxmox" ] } },
              { "Leaf": { "services": [ "vmotion" ] } },
              { "Leaf": { "hostnames": [ "esx", "hv-" ] } }
            ]
          }
        }
      ]
    },
    {
      "device_type": "ids-ips",
      "hostname_prefixes": [ "ids" ],
      "vendors": [ "Cisco Systems", "Trellix" ],
      "sys_descrs": [
        "Suricata 7.0.5",
        "Cisco Firepower Threat Defense 7.4.1"
      ],
      "services": [ "span", "syslog" ],
      "conditions": [
        {
          "Node": {
            "type": "OR",
            "sub_conditions": [
              { "Leaf": { "sys_descrs": [ "suricata", "firepower" ] } },
              { "Leaf": { "hostnames": [ "ids" ] } }
            ]
          }
        }
      ]
    },
    {
      "device_type": "load-balancer",
      "hostname_prefixes": [ "lb" ],
      "vendors": [ "F5 Networks", "HAProxy Technologies" ],
      "sys_descrs": [
        "BIG-IP 17.1.1 Build 0.0.4",
        "HAProxy 2.8.9 ALOHA"
      ],
      "services": [ "https", "health-check" ],
      "conditions": [
        {
          "Node": {
            "type": "OR",
            "sub_conditions": [
              { "Leaf": { "sys_descrs": [ "big-ip", "haproxy" ] } },
              { "Leaf": { "hostnames": [ "lb-" ], "services": [ "health-check" ] } }
            ]
          }
        }
      ]
    },
    {
      "device_type": "access-point",
      "hostname_prefixes": [ "ap" ],
      "vendors": [ "Aruba Networks", "Ubiquiti Inc." ],
      "sys_descrs": [
        "ArubaOS 8.11.2.2",
        "UniFi UAP-AC-Pro 6.6.77"
      ],
      "services": [ "capwap", "wifi" ],
      "conditions": [
        {
          "Node": {
            "type": "OR",
            "sub_conditions": [
              { "Leaf": { "sys_descrs": [ "arubaos", "unifi" ] } },
              { "Leaf": { "services": [ "capwap" ] } },
              { "Leaf": { "hostnames": [ "ap-" ] } }
            ]
          }
        }
      ]
    },
    {
      "device_type": "firewall",
      "hostname_prefixes": [ "edge-fw", "dmz-fw" ],
      "vendors": [ "Palo Alto Networks", "Fortinet" ],
      "sys_descrs": [
        "Palo Alto Networks PAN-OS 10.2.9",
        "FortiGate-200F v7.2.8 build1639"
      ],
      "services": [ "vpn", "https-mgmt" ],
      "conditions": [
        {
          "Node": {
            "type": "OR",
            "sub_conditions": [
              { "Leaf": { "sys_descrs": [ "pan-os", "fortigate" ] } },
              { "Leaf": { "hostnames": [ "fw" ], "services": [ "vpn" ] } }
            ]
          }
        }
      ]
    },
    {
      "device_type": "router",
      "hostname_prefixes": [ "core-rt", "edge-rt" ],
      "vendors": [ "Cisco Systems", "Juniper Networks" ],
      "sys_descrs": [
        "Cisco IOS XE Software, Version 17.09.04a",
        "JUNOS 21.4R3.15 Kernel 64-bit"
      ],
      "services": [ "bgp", "ospf" ],
      "conditions": [
        {
          "Node": {
            "type": "OR",
            "sub_conditions": [
              { "Leaf": { "sys_descrs": [ "ios xe", "junos" ] } },
              { "Leaf": { "services": [ "bgp" ] } },
              { "Leaf": { "hostnames": [ "core-rt", "edge-rt" ] } }
            ]
          }
        }
      ]
    },
    {
      "device_type": "switch",
      "hostname_prefixes": [ "core-sw", "dist-sw", "acc-sw" ],
      "vendors": [ "Cisco Systems", "Arista Networks" ],
      "sys_descrs": [
        "Cisco IOS Software, Catalyst L3 Switch Software 15.2(7)E7",
        "Arista EOS 4.30.5M"
      ],
      "services": [ "lldp", "stp" ],
      "conditions": [
        {
          "Node": {
            "type": "OR",
            "sub_conditions": [
              { "Leaf": { "sys_descrs": [ "catalyst", "arista eos" ] } },
              { "Leaf": { "services": [ "stp" ] } },
              { "Leaf": { "hostnames": [ "-sw" ] } }
            ]
          }
        }
      ]
    },
    {
      "device_type": "server",
      "hostname_prefixes": [ "srv-web", "srv-db", "srv-app" ],
      "vendors": [ "Dell Inc.", "Hewlett Packard Enterprise" ],
      "sys_descrs": [
        "Linux 5.15.0-107-generic #117-Ubuntu SMP x86_64",
        "Windows Server 2022 Datacenter 20348"
      ],
      "services": [ "https", "postgres" ],
      "conditions": [
        {
          "Node": {
            "type": "OR",
            "sub_conditions": [
              { "Leaf": { "sys_descrs": [ "ubuntu smp", "windows server" ] } },
              { "Leaf": { "hostnames": [ "srv-" ] } }
            ]
          }
        }
      ]
    },
    {
      "device_type": "workstation",
      "hostname_prefixes": [ "ws", "lt" ],
      "vendors": [ "Lenovo", "Apple, Inc." ],
      "sys_descrs": [
        "Windows 11 Pro 22631",
        "macOS 14.5 Darwin 23.5.0"
      ],
      "services": [ "rdp", "mdns" ],
      "conditions": [
        {
          "Node": {
            "type": "OR",
            "sub_conditions": [
              { "Leaf": { "sys_descrs": [ "windows 11", "darwin" ] } },
              { "Leaf": { "hostnames": [ "ws-", "lt-" ] } }
            ]
          }
        }
      ]
    }
  ]
}"#;
